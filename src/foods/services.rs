use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::dto::FoodFilter;
use crate::error::AppError;
use crate::models::{Food, FoodFields};
use crate::storage::RowStore;

pub const MAX_PER_100G: i64 = 10_000;

/// Checks and normalizes a food before it reaches the store.
pub fn validate(fields: FoodFields) -> Result<FoodFields, AppError> {
    let name = fields.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::invalid("food name must not be empty"));
    }
    let category = fields.category.trim().to_string();
    if category.is_empty() {
        return Err(AppError::invalid("food category must not be empty"));
    }
    if !(0..=MAX_PER_100G).contains(&fields.calories) {
        return Err(AppError::invalid(format!(
            "calories must be between 0 and {MAX_PER_100G}, got {}",
            fields.calories
        )));
    }
    if !fields.proteins.is_finite() || fields.proteins < 0.0 || fields.proteins > MAX_PER_100G as f64 {
        return Err(AppError::invalid(format!(
            "proteins must be between 0 and {MAX_PER_100G}, got {}",
            fields.proteins
        )));
    }
    Ok(FoodFields {
        name,
        category,
        ..fields
    })
}

fn matches(food: &Food, query: Option<&str>, category: Option<&str>) -> bool {
    let name_ok = query.map_or(true, |q| {
        food.name.to_lowercase().contains(&q.to_lowercase())
    });
    let category_ok = category.map_or(true, |c| food.category == c);
    name_ok && category_ok
}

pub struct FoodCatalog {
    store: Arc<dyn RowStore>,
}

impl FoodCatalog {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Foods ordered by name. Blank filter values are ignored.
    pub async fn list(&self, filter: &FoodFilter) -> Result<Vec<Food>, AppError> {
        let query = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let foods = self.store.list_foods().await?;
        Ok(foods
            .into_iter()
            .filter(|f| matches(f, query, category))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Food, AppError> {
        Ok(self.store.get_food(id).await?)
    }

    pub async fn create(&self, fields: FoodFields) -> Result<Food, AppError> {
        let fields = validate(fields)?;
        let food = self.store.insert_food(fields).await?;
        info!(food_id = %food.id, name = %food.name, "food created");
        Ok(food)
    }

    pub async fn update(&self, id: Uuid, fields: FoodFields) -> Result<Food, AppError> {
        let fields = validate(fields)?;
        self.store.update_food(id, fields.clone()).await?;
        info!(food_id = %id, "food updated");
        Ok(Food {
            id,
            name: fields.name,
            category: fields.category,
            calories: fields.calories,
            proteins: fields.proteins,
        })
    }

    /// Planning entries that point at the food are kept and count for nothing.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete_food(id).await?;
        info!(food_id = %id, "food deleted");
        Ok(())
    }
}
