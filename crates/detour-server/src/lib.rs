//! Shared library surface for the route planning server and its tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod session;
pub mod state;

use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Full application router with middleware.
pub fn app(state: Arc<AppState>) -> Router {
    api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
