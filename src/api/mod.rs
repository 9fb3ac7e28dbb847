pub mod compute;
pub mod envelope;
pub mod health;
pub mod positions;

use crate::config::Config;
use crate::db::Repository;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        Self { repo, config }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/positions", post(positions::create_position))
        .route("/v1/positions/compute", post(compute::compute_position))
        .route("/v1/positions/search", post(positions::search_positions))
        .route("/v1/positions/:id", get(positions::get_position))
        .layer(cors)
        .with_state(state)
}
