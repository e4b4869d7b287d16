use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth;
use super::customers;
use super::health;
use super::middleware::logging_middleware;
use super::state::AppState;

/// Routes under `/api/v1`
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .nest("/customers", customers::create_customer_router())
        .nest("/auth", auth::create_auth_router())
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Probes (no auth)
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .nest("/api/v1", create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
