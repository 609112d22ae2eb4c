//! API module
//!
//! HTTP endpoints, middleware and application assembly.

pub mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::TokenService;
use crate::ledger::LedgerRepository;

pub use routes::create_router;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerRepository>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(ledger: Arc<dyn LedgerRepository>, tokens: TokenService) -> Self {
        Self { ledger, tokens }
    }
}

/// Build the full application: routes, middleware and state
pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .merge(create_router(state.clone()))
        // Outermost first: tracing, then request logging
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::logging_middleware)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
