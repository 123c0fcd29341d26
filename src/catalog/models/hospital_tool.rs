use serde::{Deserialize, Serialize};

use crate::search::{FacetValue, Searchable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Complexity {
    Basic,
    Intermediate,
    Advanced,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Basic => "Basic",
            Complexity::Intermediate => "Intermediate",
            Complexity::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HospitalTool {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub uses: Vec<String>,
    pub benefits: Vec<String>,
    pub specifications: Vec<String>,
    pub price_range: String,
    pub manufacturer: Vec<String>,
    pub who_approved: bool,
    pub fda_approved: bool,
    pub ce_marked: bool,
    pub department: Vec<String>,
    pub body_part: Vec<String>,
    pub complexity: Complexity,
    pub maintenance: String,
    pub training: String,
}

impl Searchable for HospitalTool {
    const FACETS: &'static [&'static str] =
        &["category", "subcategory", "complexity", "department", "bodyPart"];

    fn text_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.subcategory.as_str(),
        ]
    }

    fn list_fields(&self) -> Vec<&[String]> {
        vec![
            self.uses.as_slice(),
            self.department.as_slice(),
            self.body_part.as_slice(),
        ]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "category" => Some(FacetValue::Exact(&self.category)),
            "subcategory" => Some(FacetValue::Exact(&self.subcategory)),
            "complexity" => Some(FacetValue::Exact(self.complexity.as_str())),
            "department" => Some(FacetValue::AnyOf(&self.department)),
            "bodyPart" => Some(FacetValue::AnyOf(&self.body_part)),
            _ => None,
        }
    }
}
