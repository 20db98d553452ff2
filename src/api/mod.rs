pub mod health;
pub mod positions;
pub mod strategies;

use crate::orchestration::{ContextRefresher, StrategySession};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<StrategySession>,
}

impl AppState {
    pub fn new(session: Arc<StrategySession>) -> Self {
        Self { session }
    }

    pub fn refresher(&self) -> &Arc<ContextRefresher> {
        self.session.refresher()
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
        .route("/v1/position-types", get(positions::get_position_types))
        .route("/v1/positions", get(positions::get_positions))
        .route("/v1/strategies", get(strategies::list_strategies))
        .route(
            "/v1/strategies/:id/evaluate",
            post(strategies::evaluate_strategy),
        )
        .route(
            "/v1/strategies/:id/compile",
            post(strategies::compile_strategy),
        )
        .layer(cors)
        .with_state(state)
}
