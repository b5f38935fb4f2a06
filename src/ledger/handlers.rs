use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    AddPlanningRequest, AdjustConsumedRequest, DayPlan, Preview, PreviewQuery, SetGoalsRequest,
    Summary, UpdateQuantityRequest,
};
use super::nutrition::Nutrients;
use crate::error::AppError;
use crate::models::PlanningEntry;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(get_summary))
        .route("/planning/today", get(get_today_planning))
        .route("/planning/preview", get(preview_entry))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/goals", put(set_goals))
        .route("/planning", post(add_planning_entry))
        .route(
            "/planning/:id",
            patch(update_planning_quantity).delete(delete_planning_entry),
        )
        .route("/planning/recompute", post(recompute_today))
        .route("/consumed/adjust", post(adjust_consumed))
}

#[instrument(skip(state))]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<Summary>, AppError> {
    Ok(Json(state.ledger.summary().await?))
}

#[instrument(skip(state))]
pub async fn set_goals(
    State(state): State<AppState>,
    Json(body): Json<SetGoalsRequest>,
) -> Result<Json<Summary>, AppError> {
    state
        .ledger
        .set_goals(body.calories_goal, body.proteins_goal)
        .await?;
    Ok(Json(state.ledger.summary().await?))
}

#[instrument(skip(state))]
pub async fn get_today_planning(State(state): State<AppState>) -> Result<Json<DayPlan>, AppError> {
    Ok(Json(state.ledger.today_planning().await?))
}

/// POST /planning { food_id, meal_type, quantity }
#[instrument(skip(state))]
pub async fn add_planning_entry(
    State(state): State<AppState>,
    Json(body): Json<AddPlanningRequest>,
) -> Result<(StatusCode, Json<PlanningEntry>), AppError> {
    let entry = state
        .ledger
        .add_planning_entry(body.food_id, body.meal_type, body.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn update_planning_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<StatusCode, AppError> {
    state
        .ledger
        .update_planning_entry_quantity(id, body.quantity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_planning_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_planning_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the resummed totals without writing them.
#[instrument(skip(state))]
pub async fn recompute_today(State(state): State<AppState>) -> Result<Json<Nutrients>, AppError> {
    Ok(Json(state.ledger.recompute_today_consumed().await?))
}

#[instrument(skip(state))]
pub async fn preview_entry(
    State(state): State<AppState>,
    Query(q): Query<PreviewQuery>,
) -> Result<Json<Preview>, AppError> {
    Ok(Json(state.ledger.preview_entry(q.food_id, q.quantity).await?))
}

#[instrument(skip(state))]
pub async fn adjust_consumed(
    State(state): State<AppState>,
    Json(body): Json<AdjustConsumedRequest>,
) -> Result<Json<Nutrients>, AppError> {
    let consumed = state
        .ledger
        .adjust_consumed(Nutrients {
            calories: body.calories,
            proteins: body.proteins,
        })
        .await?;
    Ok(Json(consumed))
}
