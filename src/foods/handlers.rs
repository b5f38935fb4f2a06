use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{FoodFilter, FoodRequest};
use crate::error::AppError;
use crate::models::Food;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/:id", get(get_food))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", post(create_food))
        .route("/foods/:id", put(update_food).delete(delete_food))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(filter): Query<FoodFilter>,
) -> Result<Json<Vec<Food>>, AppError> {
    Ok(Json(state.foods.list(&filter).await?))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Food>, AppError> {
    Ok(Json(state.foods.get(id).await?))
}

#[instrument(skip(state))]
pub async fn create_food(
    State(state): State<AppState>,
    Json(body): Json<FoodRequest>,
) -> Result<(StatusCode, Json<Food>), AppError> {
    let food = state.foods.create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

#[instrument(skip(state))]
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FoodRequest>,
) -> Result<Json<Food>, AppError> {
    Ok(Json(state.foods.update(id, body.into()).await?))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.foods.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
