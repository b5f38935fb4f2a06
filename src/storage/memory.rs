use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::Date;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RowStore, StoreError};
use crate::models::{
    Food, FoodFields, GoalsRow, GoalsUpdate, NewPlanningEntry, PlanningEntry, PlanningWithFood,
};

/// Store call names, used to inject one-shot failures in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    ListFoods,
    GetFood,
    InsertFood,
    UpdateFood,
    DeleteFood,
    Goals,
    GoalsId,
    UpdateGoals,
    InsertPlanning,
    GetPlanning,
    ListPlanning,
    UpdatePlanning,
    DeletePlanning,
}

#[derive(Debug, Default)]
struct Tables {
    foods: Vec<Food>,
    planning: Vec<PlanningEntry>,
    goals: Vec<GoalsRow>,
}

/// Process-local row store. Used with `APP_STORE=memory` and by the tests.
#[derive(Debug)]
pub struct MemoryRowStore {
    tables: Mutex<Tables>,
    available: AtomicBool,
    failures: Mutex<Vec<StoreOp>>,
}

impl Default for MemoryRowStore {
    fn default() -> Self {
        Self::with_goals(3000, 150)
    }
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the single goals row, consumed totals at zero.
    pub fn with_goals(calories_goal: i64, proteins_goal: i64) -> Self {
        let goals = GoalsRow {
            id: Uuid::new_v4(),
            calories_goal,
            proteins_goal,
            calories_consumed: 0,
            proteins_consumed: 0.0,
        };
        Self {
            tables: Mutex::new(Tables {
                goals: vec![goals],
                ..Tables::default()
            }),
            available: AtomicBool::new(true),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Store without any goals row.
    pub fn without_goals() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes the next call of `op` fail with a backend error.
    pub async fn fail_next(&self, op: StoreOp) {
        self.failures.lock().await.push(op);
    }

    async fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        let mut failures = self.failures.lock().await;
        if let Some(pos) = failures.iter().position(|f| *f == op) {
            failures.remove(pos);
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected failure on {op:?}"
            )));
        }
        Ok(())
    }
}

fn join(tables: &Tables, entry: &PlanningEntry) -> PlanningWithFood {
    PlanningWithFood {
        entry: entry.clone(),
        food: tables.foods.iter().find(|f| f.id == entry.food_id).cloned(),
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn list_foods(&self) -> Result<Vec<Food>, StoreError> {
        self.check(StoreOp::ListFoods).await?;
        let tables = self.tables.lock().await;
        let mut foods = tables.foods.clone();
        foods.sort_by_cached_key(|f| (f.name.to_lowercase(), f.name.clone()));
        Ok(foods)
    }

    async fn get_food(&self, id: Uuid) -> Result<Food, StoreError> {
        self.check(StoreOp::GetFood).await?;
        let tables = self.tables.lock().await;
        tables
            .foods
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("foods", id))
    }

    async fn insert_food(&self, fields: FoodFields) -> Result<Food, StoreError> {
        self.check(StoreOp::InsertFood).await?;
        let food = Food {
            id: Uuid::new_v4(),
            name: fields.name,
            category: fields.category,
            calories: fields.calories,
            proteins: fields.proteins,
        };
        self.tables.lock().await.foods.push(food.clone());
        Ok(food)
    }

    async fn update_food(&self, id: Uuid, fields: FoodFields) -> Result<(), StoreError> {
        self.check(StoreOp::UpdateFood).await?;
        let mut tables = self.tables.lock().await;
        let food = tables
            .foods
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| StoreError::not_found("foods", id))?;
        food.name = fields.name;
        food.category = fields.category;
        food.calories = fields.calories;
        food.proteins = fields.proteins;
        Ok(())
    }

    async fn delete_food(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(StoreOp::DeleteFood).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.foods.len();
        tables.foods.retain(|f| f.id != id);
        if tables.foods.len() == before {
            return Err(StoreError::not_found("foods", id));
        }
        Ok(())
    }

    async fn goals(&self) -> Result<GoalsRow, StoreError> {
        self.check(StoreOp::Goals).await?;
        let tables = self.tables.lock().await;
        tables
            .goals
            .first()
            .cloned()
            .ok_or_else(|| StoreError::not_found("global_goals", "single"))
    }

    async fn goals_id(&self) -> Result<Uuid, StoreError> {
        self.check(StoreOp::GoalsId).await?;
        let tables = self.tables.lock().await;
        tables
            .goals
            .first()
            .map(|g| g.id)
            .ok_or_else(|| StoreError::not_found("global_goals", "single"))
    }

    async fn update_goals(&self, id: Uuid, update: GoalsUpdate) -> Result<(), StoreError> {
        self.check(StoreOp::UpdateGoals).await?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| StoreError::not_found("global_goals", id))?;
        match update {
            GoalsUpdate::Targets {
                calories_goal,
                proteins_goal,
            } => {
                row.calories_goal = calories_goal;
                row.proteins_goal = proteins_goal;
            }
            GoalsUpdate::Consumed { calories, proteins } => {
                row.calories_consumed = calories;
                row.proteins_consumed = proteins;
            }
        }
        Ok(())
    }

    async fn insert_planning(&self, entry: NewPlanningEntry) -> Result<PlanningEntry, StoreError> {
        self.check(StoreOp::InsertPlanning).await?;
        let entry = PlanningEntry {
            id: Uuid::new_v4(),
            food_id: entry.food_id,
            date: entry.date,
            meal_type: entry.meal_type,
            quantity: entry.quantity,
        };
        self.tables.lock().await.planning.push(entry.clone());
        Ok(entry)
    }

    async fn get_planning(&self, id: Uuid) -> Result<PlanningWithFood, StoreError> {
        self.check(StoreOp::GetPlanning).await?;
        let tables = self.tables.lock().await;
        tables
            .planning
            .iter()
            .find(|p| p.id == id)
            .map(|p| join(&tables, p))
            .ok_or_else(|| StoreError::not_found("daily_planning", id))
    }

    async fn list_planning_for_day(&self, date: Date) -> Result<Vec<PlanningWithFood>, StoreError> {
        self.check(StoreOp::ListPlanning).await?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<PlanningWithFood> = tables
            .planning
            .iter()
            .filter(|p| p.date == date)
            .map(|p| join(&tables, p))
            .collect();
        // stable: keeps insertion order inside a slot
        rows.sort_by_key(|r| r.entry.meal_type);
        Ok(rows)
    }

    async fn update_planning_quantity(&self, id: Uuid, quantity: i64) -> Result<(), StoreError> {
        self.check(StoreOp::UpdatePlanning).await?;
        let mut tables = self.tables.lock().await;
        let entry = tables
            .planning
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("daily_planning", id))?;
        entry.quantity = quantity;
        Ok(())
    }

    async fn delete_planning(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(StoreOp::DeletePlanning).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.planning.len();
        tables.planning.retain(|p| p.id != id);
        if tables.planning.len() == before {
            return Err(StoreError::not_found("daily_planning", id));
        }
        Ok(())
    }
}
