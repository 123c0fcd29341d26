use serde::{Deserialize, Serialize};

use crate::search::{FacetValue, Searchable};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: u32,
    pub name: String,
    pub generic_name: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub composition: String,
    pub dosage: String,
    pub max_dose: String,
    pub side_effects: Vec<String>,
    pub benefits: Vec<String>,
    pub contraindications: Vec<String>,
    pub interactions: Vec<String>,
    /// Price at Jan Aushadhi generic stores.
    pub jan_aushadhi_price: String,
    pub brand_price: String,
    pub who_approved: bool,
    pub fda_approved: bool,
    pub jan_aushadhi_available: bool,
    pub prescription_required: bool,
    pub age_group: Vec<String>,
    pub storage: String,
    pub manufacturer: Vec<String>,
}

impl Searchable for Medicine {
    const FACETS: &'static [&'static str] = &[
        "category",
        "subcategory",
        "janAushadhi",
        "prescription",
        "whoApproved",
        "manufacturer",
    ];

    fn text_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.generic_name.as_str(),
            self.category.as_str(),
            self.description.as_str(),
            self.composition.as_str(),
        ]
    }

    fn list_fields(&self) -> Vec<&[String]> {
        vec![
            self.benefits.as_slice(),
            self.manufacturer.as_slice(),
        ]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "category" => Some(FacetValue::Exact(&self.category)),
            "subcategory" => Some(FacetValue::Exact(&self.subcategory)),
            "janAushadhi" => Some(FacetValue::Flag(self.jan_aushadhi_available)),
            "prescription" => Some(FacetValue::Flag(self.prescription_required)),
            "whoApproved" => Some(FacetValue::Flag(self.who_approved)),
            "manufacturer" => Some(FacetValue::AnyOf(&self.manufacturer)),
            _ => None,
        }
    }
}
