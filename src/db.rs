use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{
    Food, FoodFields, GoalsRow, GoalsUpdate, NewPlanningEntry, PlanningEntry, PlanningWithFood,
};
use crate::storage::{RowStore, StoreError};

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres store")?;
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(url)
        .await
        .context("connect to database")
}

/// `RowStore` over the `foods`, `daily_planning` and `global_goals` tables.
#[derive(Clone)]
pub struct PgRowStore {
    db: PgPool,
}

impl PgRowStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn store_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable
        }
        other => StoreError::Backend(anyhow::Error::new(other)),
    }
}

#[derive(Debug, FromRow)]
struct PlanningRow {
    id: Uuid,
    food_id: Uuid,
    date: Date,
    meal_type: String,
    quantity: i64,
    f_id: Option<Uuid>,
    f_name: Option<String>,
    f_category: Option<String>,
    f_calories: Option<i64>,
    f_proteins: Option<f64>,
}

impl TryFrom<PlanningRow> for PlanningWithFood {
    type Error = StoreError;

    fn try_from(r: PlanningRow) -> Result<Self, Self::Error> {
        let meal_type = r
            .meal_type
            .parse()
            .map_err(|e: String| StoreError::Backend(anyhow::anyhow!(e)))?;
        let food = match (r.f_id, r.f_name, r.f_category, r.f_calories, r.f_proteins) {
            (Some(id), Some(name), Some(category), Some(calories), Some(proteins)) => Some(Food {
                id,
                name,
                category,
                calories,
                proteins,
            }),
            _ => None,
        };
        Ok(PlanningWithFood {
            entry: PlanningEntry {
                id: r.id,
                food_id: r.food_id,
                date: r.date,
                meal_type,
                quantity: r.quantity,
            },
            food,
        })
    }
}

const PLANNING_SELECT: &str = r#"
    SELECT p.id, p.food_id, p.date, p.meal_type, p.quantity,
           f.id AS f_id, f.name AS f_name, f.category AS f_category,
           f.calories AS f_calories, f.proteins AS f_proteins
      FROM daily_planning p
      LEFT JOIN foods f ON f.id = p.food_id
"#;

#[async_trait]
impl RowStore for PgRowStore {
    async fn list_foods(&self) -> Result<Vec<Food>, StoreError> {
        sqlx::query_as::<_, Food>(
            r#"
            SELECT id, name, category, calories, proteins
              FROM foods
             ORDER BY lower(name), name
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(store_err)
    }

    async fn get_food(&self, id: Uuid) -> Result<Food, StoreError> {
        sqlx::query_as::<_, Food>(
            r#"
            SELECT id, name, category, calories, proteins
              FROM foods
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(store_err)?
        .ok_or_else(|| StoreError::not_found("foods", id))
    }

    async fn insert_food(&self, fields: FoodFields) -> Result<Food, StoreError> {
        sqlx::query_as::<_, Food>(
            r#"
            INSERT INTO foods (name, category, calories, proteins)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category, calories, proteins
            "#,
        )
        .bind(fields.name)
        .bind(fields.category)
        .bind(fields.calories)
        .bind(fields.proteins)
        .fetch_one(&self.db)
        .await
        .map_err(store_err)
    }

    async fn update_food(&self, id: Uuid, fields: FoodFields) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE foods
               SET name = $2, category = $3, calories = $4, proteins = $5
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.category)
        .bind(fields.calories)
        .bind(fields.proteins)
        .execute(&self.db)
        .await
        .map_err(store_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("foods", id));
        }
        Ok(())
    }

    async fn delete_food(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM foods WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(store_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("foods", id));
        }
        Ok(())
    }

    async fn goals(&self) -> Result<GoalsRow, StoreError> {
        sqlx::query_as::<_, GoalsRow>(
            r#"
            SELECT id, calories_goal, proteins_goal, calories_consumed, proteins_consumed
              FROM global_goals
             LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await
        .map_err(store_err)?
        .ok_or_else(|| StoreError::not_found("global_goals", "single"))
    }

    async fn goals_id(&self) -> Result<Uuid, StoreError> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM global_goals LIMIT 1")
            .fetch_optional(&self.db)
            .await
            .map_err(store_err)?
            .ok_or_else(|| StoreError::not_found("global_goals", "single"))
    }

    async fn update_goals(&self, id: Uuid, update: GoalsUpdate) -> Result<(), StoreError> {
        let query = match update {
            GoalsUpdate::Targets {
                calories_goal,
                proteins_goal,
            } => sqlx::query(
                "UPDATE global_goals SET calories_goal = $2, proteins_goal = $3 WHERE id = $1",
            )
            .bind(id)
            .bind(calories_goal)
            .bind(proteins_goal),
            GoalsUpdate::Consumed { calories, proteins } => sqlx::query(
                "UPDATE global_goals SET calories_consumed = $2, proteins_consumed = $3 WHERE id = $1",
            )
            .bind(id)
            .bind(calories)
            .bind(proteins),
        };
        let res = query.execute(&self.db).await.map_err(store_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("global_goals", id));
        }
        Ok(())
    }

    async fn insert_planning(&self, entry: NewPlanningEntry) -> Result<PlanningEntry, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO daily_planning (food_id, date, meal_type, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(entry.food_id)
        .bind(entry.date)
        .bind(entry.meal_type.as_str())
        .bind(entry.quantity)
        .fetch_one(&self.db)
        .await
        .map_err(store_err)?;

        Ok(PlanningEntry {
            id,
            food_id: entry.food_id,
            date: entry.date,
            meal_type: entry.meal_type,
            quantity: entry.quantity,
        })
    }

    async fn get_planning(&self, id: Uuid) -> Result<PlanningWithFood, StoreError> {
        let sql = format!("{PLANNING_SELECT} WHERE p.id = $1");
        sqlx::query_as::<_, PlanningRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(store_err)?
            .ok_or_else(|| StoreError::not_found("daily_planning", id))?
            .try_into()
    }

    async fn list_planning_for_day(&self, date: Date) -> Result<Vec<PlanningWithFood>, StoreError> {
        let sql = format!(
            r#"{PLANNING_SELECT}
             WHERE p.date = $1
             ORDER BY CASE p.meal_type
                        WHEN 'morning' THEN 0
                        WHEN 'noon' THEN 1
                        WHEN 'snack' THEN 2
                        ELSE 3
                      END,
                      p.created_at"#
        );
        let rows = sqlx::query_as::<_, PlanningRow>(&sql)
            .bind(date)
            .fetch_all(&self.db)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(PlanningWithFood::try_from).collect()
    }

    async fn update_planning_quantity(&self, id: Uuid, quantity: i64) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE daily_planning SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&self.db)
            .await
            .map_err(store_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("daily_planning", id));
        }
        Ok(())
    }

    async fn delete_planning(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM daily_planning WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(store_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("daily_planning", id));
        }
        Ok(())
    }
}
