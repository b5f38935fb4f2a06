pub mod dto;
pub mod handlers;
pub mod nutrition;
mod services;

use crate::state::AppState;
use axum::Router;

pub use nutrition::{Nutrients, Tone};
pub use services::NutritionLedger;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
