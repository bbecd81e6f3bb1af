//! Application routing.
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!     ┌────┴──────────────────────┐
//!     ▼                           ▼
//! /health                     everything else
//! HelmetLayer                 Dispatcher
//!     │                       [RequestId, Helmet]
//!     ▼                           │
//! health_check                    ▼
//!                              greeting
//! ```
//!
//! Both branches share one resolved rule set, so `/health` and the
//! dispatched routes carry identical security headers.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::RequestId;
use crate::pipeline::{Dispatcher, MiddlewareChain};
use crate::state::AppState;

/// The demo chain: request IDs outermost, security headers innermost.
pub fn build_chain(state: &AppState) -> MiddlewareChain {
    MiddlewareChain::new()
        .with(RequestId::new())
        .with(state.helmet.clone())
}

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let chain = build_chain(&state);
    let dispatcher = Dispatcher::new(&chain, handlers::greeting);

    info!(
        units = dispatcher.depth(),
        rules = state.helmet.rules().len(),
        "Middleware pipeline configured"
    );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route_layer(state.helmet.layer())
        .fallback_service(dispatcher)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
