pub mod dto;
pub mod handlers;
mod services;

use crate::state::AppState;
use axum::Router;

pub use services::FoodCatalog;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
