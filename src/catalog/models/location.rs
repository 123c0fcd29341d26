use serde::{Deserialize, Serialize};

use crate::search::{
    geo::{GeoPoint, Located},
    FacetValue, Searchable,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    /// `hospital`, `pharmacy`, `clinic`, `diagnostic` or `jan-aushadhi`.
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    pub rating: f32,
    pub reviews: u32,
    pub open_hours: String,
    pub services: Vec<String>,
    pub facilities: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub verified: bool,
    pub emergency: bool,
    pub insurance: Vec<String>,
}

impl Location {
    pub fn directions_url(&self, from: GeoPoint) -> String {
        format!(
            "https://www.google.com/maps/dir/{},{}/{},{}",
            from.lat, from.lng, self.lat, self.lng
        )
    }
}

impl Located for Location {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

impl Searchable for Location {
    const FACETS: &'static [&'static str] =
        &["type", "city", "service", "facility", "insurance", "emergency"];

    fn text_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.kind.as_str(),
            self.address.as_str(),
            self.city.as_str(),
        ]
    }

    fn list_fields(&self) -> Vec<&[String]> {
        vec![
            self.services.as_slice(),
            self.facilities.as_slice(),
            self.insurance.as_slice(),
        ]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "type" => Some(FacetValue::Exact(&self.kind)),
            "city" => Some(FacetValue::Exact(&self.city)),
            "service" => Some(FacetValue::AnyOf(&self.services)),
            "facility" => Some(FacetValue::AnyOf(&self.facilities)),
            "insurance" => Some(FacetValue::AnyOf(&self.insurance)),
            "emergency" => Some(FacetValue::Flag(self.emergency)),
            _ => None,
        }
    }
}
