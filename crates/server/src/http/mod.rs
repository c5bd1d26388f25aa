//! HTTP API.
//!
//! - `POST /assist` answers a query
//! - `GET /health` reports the loaded models

pub mod contract;
pub mod error;
pub mod routes;

use assist_knowledge::Assistant;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/assist", post(routes::assist))
        .route("/health", get(routes::health))
        .with_state(state)
}
