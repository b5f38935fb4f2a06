pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::models::{
    Food, FoodFields, GoalsRow, GoalsUpdate, NewPlanningEntry, PlanningEntry, PlanningWithFood,
};

pub use memory::MemoryRowStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row store is not available")]
    Unavailable,

    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("row store failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(table: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            table,
            id: id.to_string(),
        }
    }
}

/// Persistent rows behind the ledger and the food catalog.
///
/// Every call is one round trip to the backend. Implementations do not group
/// calls into transactions; callers sequence them and own the consequences of
/// a failure between two calls.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All foods ordered by name, ignoring case.
    async fn list_foods(&self) -> Result<Vec<Food>, StoreError>;
    async fn get_food(&self, id: Uuid) -> Result<Food, StoreError>;
    async fn insert_food(&self, fields: FoodFields) -> Result<Food, StoreError>;
    async fn update_food(&self, id: Uuid, fields: FoodFields) -> Result<(), StoreError>;
    async fn delete_food(&self, id: Uuid) -> Result<(), StoreError>;

    /// The single goals row. Fails with `NotFound` if the installation has none.
    async fn goals(&self) -> Result<GoalsRow, StoreError>;
    async fn goals_id(&self) -> Result<Uuid, StoreError>;
    async fn update_goals(&self, id: Uuid, update: GoalsUpdate) -> Result<(), StoreError>;

    async fn insert_planning(&self, entry: NewPlanningEntry) -> Result<PlanningEntry, StoreError>;
    async fn get_planning(&self, id: Uuid) -> Result<PlanningWithFood, StoreError>;
    /// Entries of one day ordered by meal slot, then by creation.
    async fn list_planning_for_day(&self, date: Date) -> Result<Vec<PlanningWithFood>, StoreError>;
    async fn update_planning_quantity(&self, id: Uuid, quantity: i64) -> Result<(), StoreError>;
    async fn delete_planning(&self, id: Uuid) -> Result<(), StoreError>;
}
