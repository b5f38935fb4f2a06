use serde::Deserialize;

use crate::models::FoodFields;

#[derive(Debug, Default, Deserialize)]
pub struct FoodFilter {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// Body of POST /foods and PUT /foods/:id.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodRequest {
    pub name: String,
    pub category: String,
    pub calories: i64,
    #[serde(default)]
    pub proteins: f64,
}

impl From<FoodRequest> for FoodFields {
    fn from(r: FoodRequest) -> Self {
        FoodFields {
            name: r.name,
            category: r.category,
            calories: r.calories,
            proteins: r.proteins,
        }
    }
}
