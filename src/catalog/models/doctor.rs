use serde::{Deserialize, Serialize};

use crate::search::{FacetValue, Searchable};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: u32,
    pub name: String,
    /// Slug such as `cardiology`; the specialty facet compares against it.
    pub specialty: String,
    #[serde(default)]
    pub subspecialty: Option<String>,
    pub qualification: Vec<String>,
    pub experience: String,
    /// City slug used by the location facet.
    pub location: String,
    pub city: String,
    pub state: String,
    pub hospital: String,
    pub hospital_type: String,
    pub rating: f32,
    pub reviews: u32,
    pub phone: String,
    pub email: String,
    pub consultation_fee: String,
    #[serde(default)]
    pub online_consultation_fee: Option<String>,
    pub languages: Vec<String>,
    pub availability: String,
    pub specializations: Vec<String>,
    pub verified: bool,
    pub telemedicine: bool,
    pub emergency_available: bool,
}

impl Searchable for Doctor {
    const FACETS: &'static [&'static str] = &[
        "specialty",
        "location",
        "hospitalType",
        "language",
        "telemedicine",
        "emergency",
        "verified",
    ];

    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.name.as_str(),
            self.specialty.as_str(),
            self.hospital.as_str(),
            self.city.as_str(),
        ];
        if let Some(sub) = &self.subspecialty {
            fields.push(sub);
        }
        fields
    }

    fn list_fields(&self) -> Vec<&[String]> {
        vec![
            self.specializations.as_slice(),
            self.languages.as_slice(),
            self.qualification.as_slice(),
        ]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "specialty" => Some(FacetValue::Exact(&self.specialty)),
            "location" => Some(FacetValue::Exact(&self.location)),
            "hospitalType" => Some(FacetValue::Exact(&self.hospital_type)),
            "language" => Some(FacetValue::AnyOf(&self.languages)),
            "telemedicine" => Some(FacetValue::Flag(self.telemedicine)),
            "emergency" => Some(FacetValue::Flag(self.emergency_available)),
            "verified" => Some(FacetValue::Flag(self.verified)),
            _ => None,
        }
    }
}
