use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::nutrition::{Nutrients, Tone};
use crate::models::MealType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub calories_goal: i64,
    pub proteins_goal: i64,
    pub calories_consumed: i64,
    pub proteins_consumed: f64,
    pub calories_remaining: i64,
    pub proteins_remaining: f64,
    pub calories_tone: Tone,
    pub proteins_tone: Tone,
}

/// What adding an entry would do, without writing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub contribution: Nutrients,
    pub calories_remaining: i64,
    pub proteins_remaining: f64,
    pub calories_tone: Tone,
    pub proteins_tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedItem {
    pub id: Uuid,
    pub food_id: Uuid,
    pub food_name: Option<String>, // None once the food left the catalog
    pub quantity: i64,
    pub contribution: Nutrients,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSlot {
    pub meal_type: MealType,
    pub items: Vec<PlannedItem>,
    pub total: Nutrients,
}

/// Today's plan grouped by meal slot; every slot is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: String,
    pub slots: Vec<MealSlot>,
    pub total: Nutrients,
}

#[derive(Debug, Deserialize)]
pub struct SetGoalsRequest {
    #[serde(default = "default_calories_goal")]
    pub calories_goal: i64,
    #[serde(default = "default_proteins_goal")]
    pub proteins_goal: i64,
}

fn default_calories_goal() -> i64 {
    3000
}

fn default_proteins_goal() -> i64 {
    150
}

#[derive(Debug, Deserialize)]
pub struct AddPlanningRequest {
    pub food_id: Uuid,
    pub meal_type: MealType,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub food_id: Uuid,
    pub quantity: i64,
}

/// Signed change to the cached consumed totals.
#[derive(Debug, Deserialize)]
pub struct AdjustConsumedRequest {
    #[serde(default)]
    pub calories: i64,
    #[serde(default)]
    pub proteins: f64,
}
