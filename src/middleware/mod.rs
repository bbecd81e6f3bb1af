//! Middleware units that compose with [`Helmet`](crate::helmet::Helmet).
//!
//! ```text
//! Request → RequestId → Helmet → terminal
//!              ↓           ↓
//!      X-Request-Id    security headers
//! ```

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdExt};
