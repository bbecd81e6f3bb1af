//! # HP Helmet
//!
//! A composable async middleware pipeline with a helmet-style unit that
//! hardens HTTP responses with security headers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Dispatcher (tower::Service, metrics, error → 500)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MiddlewareChain (RequestId → Helmet → ...)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Helmet: HelmetOptions → ResolvedRuleSet → HeaderRule       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Terminal handler                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use axum::body::Body;
//! use axum::http::{Request, Response};
//! use helmet_pipeline::{Helmet, HelmetOptions, MiddlewareChain};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let helmet = Helmet::new(&HelmetOptions::from_json_str(r#"{ "hsts": { "preload": true } }"#)?)?;
//! let pipeline = MiddlewareChain::new()
//!     .with(helmet)
//!     .build(|_req: Request<Body>| Response::new(Body::from("hello")));
//!
//! let response = pipeline.call(Request::new(Body::empty())).await?;
//! assert_eq!(
//!     response.headers()["strict-transport-security"],
//!     "max-age=15552000; includeSubDomains; preload"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the demo server
//!
//! ```bash
//! HELMET_CONFIG=helmet.json PORT=8080 cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod helmet;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, ConfigResult, PipelineError, PipelineResult};
pub use helmet::{Helmet, HelmetLayer, HelmetOptions};
pub use pipeline::{Dispatcher, Middleware, MiddlewareChain, Next};
pub use routes::build_router;
pub use state::AppState;
