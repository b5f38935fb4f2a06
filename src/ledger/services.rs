use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{DayPlan, MealSlot, PlannedItem, Preview, Summary};
use super::nutrition::{calories_tone, contribution, proteins_tone, round2, Nutrients};
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{GoalsRow, GoalsUpdate, MealType, NewPlanningEntry, PlanningEntry, PlanningWithFood};
use crate::storage::RowStore;

/// Keeps the cached consumed totals of the goals row in line with today's
/// planning entries.
///
/// Mutations are sequences of independent store calls. A failure between two
/// calls aborts the operation and leaves the goals row and the planning table
/// out of step; nothing is rolled back. Callers retry the whole operation.
/// Within one process, mutations are serialized by `writes`; writers in other
/// processes can still race on the goals row.
pub struct NutritionLedger {
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    writes: Mutex<()>,
}

fn entry_contribution(row: &PlanningWithFood) -> Nutrients {
    row.food
        .as_ref()
        .map(|food| contribution(food, row.entry.quantity))
        .unwrap_or_default()
}

/// Largest accepted entry, in grams.
pub const MAX_QUANTITY_G: i64 = 100_000;

fn ensure_quantity(quantity: i64) -> Result<(), AppError> {
    if !(1..=MAX_QUANTITY_G).contains(&quantity) {
        return Err(AppError::invalid(format!(
            "quantity must be between 1 and {MAX_QUANTITY_G} grams, got {quantity}"
        )));
    }
    Ok(())
}

// Goals are stored unchecked, so the difference may leave i64.
fn remaining(goals: &GoalsRow, consumed: Nutrients) -> (i64, f64) {
    (
        goals.calories_goal.saturating_sub(consumed.calories),
        round2(goals.proteins_goal as f64 - consumed.proteins),
    )
}

impl NutritionLedger {
    pub fn new(store: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            writes: Mutex::new(()),
        }
    }

    pub async fn summary(&self) -> Result<Summary, AppError> {
        let goals = self.store.goals().await?;
        let (calories_remaining, proteins_remaining) =
            remaining(&goals, Nutrients::consumed(&goals));
        Ok(Summary {
            calories_goal: goals.calories_goal,
            proteins_goal: goals.proteins_goal,
            calories_consumed: goals.calories_consumed,
            proteins_consumed: goals.proteins_consumed,
            calories_remaining,
            proteins_remaining,
            calories_tone: calories_tone(calories_remaining),
            proteins_tone: proteins_tone(proteins_remaining),
        })
    }

    /// Overwrites the targets. Consumed totals are left alone and the values
    /// are stored as given.
    pub async fn set_goals(&self, calories_goal: i64, proteins_goal: i64) -> Result<(), AppError> {
        let _guard = self.writes.lock().await;
        let id = self.store.goals_id().await?;
        self.store
            .update_goals(
                id,
                GoalsUpdate::Targets {
                    calories_goal,
                    proteins_goal,
                },
            )
            .await?;
        info!(calories_goal, proteins_goal, "goals updated");
        Ok(())
    }

    /// Creates an entry for today, then rewrites the consumed totals from a
    /// full resum of the day. Each call adds a new row.
    pub async fn add_planning_entry(
        &self,
        food_id: Uuid,
        meal_type: MealType,
        quantity: i64,
    ) -> Result<PlanningEntry, AppError> {
        ensure_quantity(quantity)?;
        let _guard = self.writes.lock().await;

        self.store.get_food(food_id).await?;
        let entry = self
            .store
            .insert_planning(NewPlanningEntry {
                food_id,
                date: self.clock.today(),
                meal_type,
                quantity,
            })
            .await?;

        let consumed = self.recompute_today_consumed().await?;
        self.write_consumed(consumed).await?;

        info!(
            entry_id = %entry.id,
            %food_id,
            %meal_type,
            quantity,
            calories = consumed.calories,
            proteins = consumed.proteins,
            "planning entry added"
        );
        Ok(entry)
    }

    /// Applies `consumed - old + new` to the cached totals, then stores the new
    /// quantity. Unlike `add_planning_entry` this does not resum the day, so an
    /// aggregate that already drifted stays drifted.
    pub async fn update_planning_entry_quantity(
        &self,
        entry_id: Uuid,
        new_quantity: i64,
    ) -> Result<(), AppError> {
        ensure_quantity(new_quantity)?;
        let _guard = self.writes.lock().await;

        let row = self.store.get_planning(entry_id).await?;
        let old = entry_contribution(&row);
        let new = row
            .food
            .as_ref()
            .map(|food| contribution(food, new_quantity))
            .unwrap_or_default();

        let goals = self.store.goals().await?;
        let consumed = (Nutrients::consumed(&goals) - old + new).clamped();
        self.store
            .update_goals(
                goals.id,
                GoalsUpdate::Consumed {
                    calories: consumed.calories,
                    proteins: consumed.proteins,
                },
            )
            .await?;
        self.store
            .update_planning_quantity(entry_id, new_quantity)
            .await?;

        info!(
            %entry_id,
            old_quantity = row.entry.quantity,
            new_quantity,
            calories = consumed.calories,
            proteins = consumed.proteins,
            "planning quantity updated"
        );
        Ok(())
    }

    /// Subtracts the entry's contribution from the cached totals, then deletes it.
    pub async fn delete_planning_entry(&self, entry_id: Uuid) -> Result<(), AppError> {
        let _guard = self.writes.lock().await;

        let row = self.store.get_planning(entry_id).await?;
        let removed = entry_contribution(&row);

        let goals = self.store.goals().await?;
        let consumed = (Nutrients::consumed(&goals) - removed).clamped();
        self.store
            .update_goals(
                goals.id,
                GoalsUpdate::Consumed {
                    calories: consumed.calories,
                    proteins: consumed.proteins,
                },
            )
            .await?;
        self.store.delete_planning(entry_id).await?;

        info!(
            %entry_id,
            removed_calories = removed.calories,
            removed_proteins = removed.proteins,
            calories = consumed.calories,
            proteins = consumed.proteins,
            "planning entry deleted"
        );
        Ok(())
    }

    /// Sum of the derived contributions of every entry dated today.
    pub async fn recompute_today_consumed(&self) -> Result<Nutrients, AppError> {
        let today = self.clock.today();
        let rows = self.store.list_planning_for_day(today).await?;
        let total = rows
            .iter()
            .map(entry_contribution)
            .fold(Nutrients::default(), |acc, c| acc + c);
        debug!(
            %today,
            entries = rows.len(),
            calories = total.calories,
            proteins = total.proteins,
            "day recomputed"
        );
        Ok(total)
    }

    pub async fn today_planning(&self) -> Result<DayPlan, AppError> {
        let today = self.clock.today();
        let rows = self.store.list_planning_for_day(today).await?;

        let mut slots: Vec<MealSlot> = MealType::ALL
            .iter()
            .map(|meal_type| MealSlot {
                meal_type: *meal_type,
                items: Vec::new(),
                total: Nutrients::default(),
            })
            .collect();
        let mut total = Nutrients::default();

        for row in &rows {
            let c = entry_contribution(row);
            total = total + c;
            if let Some(slot) = slots.iter_mut().find(|s| s.meal_type == row.entry.meal_type) {
                slot.total = slot.total + c;
                slot.items.push(PlannedItem {
                    id: row.entry.id,
                    food_id: row.entry.food_id,
                    food_name: row.food.as_ref().map(|f| f.name.clone()),
                    quantity: row.entry.quantity,
                    contribution: c,
                });
            }
        }

        Ok(DayPlan {
            date: today.to_string(),
            slots,
            total,
        })
    }

    /// Contribution of a prospective entry and the remaining values once it
    /// is counted. Writes nothing.
    pub async fn preview_entry(&self, food_id: Uuid, quantity: i64) -> Result<Preview, AppError> {
        ensure_quantity(quantity)?;
        let food = self.store.get_food(food_id).await?;
        let goals = self.store.goals().await?;

        let added = contribution(&food, quantity);
        let (calories_remaining, proteins_remaining) =
            remaining(&goals, Nutrients::consumed(&goals) + added);
        Ok(Preview {
            contribution: added,
            calories_remaining,
            proteins_remaining,
            calories_tone: calories_tone(calories_remaining),
            proteins_tone: proteins_tone(proteins_remaining),
        })
    }

    /// Shifts the cached totals by a signed delta, floored at zero. Planning
    /// entries are not touched, so the next resum discards the adjustment.
    pub async fn adjust_consumed(&self, delta: Nutrients) -> Result<Nutrients, AppError> {
        let _guard = self.writes.lock().await;
        let goals = self.store.goals().await?;
        let consumed = (Nutrients::consumed(&goals) + delta).clamped();
        self.store
            .update_goals(
                goals.id,
                GoalsUpdate::Consumed {
                    calories: consumed.calories,
                    proteins: consumed.proteins,
                },
            )
            .await?;
        info!(
            delta_calories = delta.calories,
            delta_proteins = delta.proteins,
            calories = consumed.calories,
            proteins = consumed.proteins,
            "consumed adjusted"
        );
        Ok(consumed)
    }

    async fn write_consumed(&self, consumed: Nutrients) -> Result<(), AppError> {
        let id = self.store.goals_id().await?;
        self.store
            .update_goals(
                id,
                GoalsUpdate::Consumed {
                    calories: consumed.calories,
                    proteins: consumed.proteins,
                },
            )
            .await?;
        Ok(())
    }
}
