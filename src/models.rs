use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Food record in the catalog. Nutrition values are per 100 g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub calories: i64,
    pub proteins: f64,
}

/// Fields written when creating or editing a food.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodFields {
    pub name: String,
    pub category: String,
    pub calories: i64,
    pub proteins: f64,
}

/// Meal slot a planning entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Morning,
    Noon,
    Snack,
    Evening,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Morning,
        MealType::Noon,
        MealType::Snack,
        MealType::Evening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Morning => "morning",
            MealType::Noon => "noon",
            MealType::Snack => "snack",
            MealType::Evening => "evening",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(MealType::Morning),
            "noon" => Ok(MealType::Noon),
            "snack" => Ok(MealType::Snack),
            "evening" => Ok(MealType::Evening),
            other => Err(format!("unknown meal type '{other}'")),
        }
    }
}

/// One food assigned to a meal slot on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningEntry {
    pub id: Uuid,
    pub food_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meal_type: MealType,
    pub quantity: i64, // grams
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlanningEntry {
    pub food_id: Uuid,
    pub date: Date,
    pub meal_type: MealType,
    pub quantity: i64,
}

/// Planning entry joined with its food. `food` is `None` when the food
/// was deleted from the catalog after the entry was created.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningWithFood {
    pub entry: PlanningEntry,
    pub food: Option<Food>,
}

/// The single goals row of the installation, with the cached consumed totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GoalsRow {
    pub id: Uuid,
    pub calories_goal: i64,
    pub proteins_goal: i64,
    pub calories_consumed: i64,
    pub proteins_consumed: f64,
}

/// Partial write to the goals row.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalsUpdate {
    Targets { calories_goal: i64, proteins_goal: i64 },
    Consumed { calories: i64, proteins: f64 },
}
