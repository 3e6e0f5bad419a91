pub mod asi;
pub mod system;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

pub fn system_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", axum::routing::get(system::root))
        .route("/health", axum::routing::get(system::health))
}

pub fn asi_routes() -> Router<Arc<AppState>> {
    Router::new().route("/asi", axum::routing::post(asi::score_deck))
}
