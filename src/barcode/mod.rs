mod services;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

pub use services::{BarcodeLookup, OpenFoodFacts, ScannedFood};

pub fn router() -> Router<AppState> {
    Router::new().route("/barcode/:code", get(lookup_barcode))
}

#[instrument(skip(state))]
pub async fn lookup_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ScannedFood>, AppError> {
    state
        .barcode
        .lookup(&code)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {code}")))
}
