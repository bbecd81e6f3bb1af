//! Request ID unit for correlating pipeline runs.
//!
//! # Features
//!
//! - Generates UUIDv4 request IDs for incoming requests without one
//! - Propagates existing `X-Request-Id` headers
//! - Adds `X-Request-Id` to the response once the rest of the chain resolves
//!
//! # Client Usage
//!
//! ```bash
//! curl -i -H "X-Request-Id: my-correlation-id" http://localhost:8080/
//! ```
//!
//! The same ID is returned in the response for correlation.

use axum::body::Body;
use axum::http::Request;
use axum::http::header::{HeaderName, HeaderValue};
use futures_util::FutureExt;
use tracing::debug;
use uuid::Uuid;

use crate::pipeline::{Eventual, Middleware, Next};
use crate::response::ResponseExt;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Fallback header value when request ID parsing fails.
static UNKNOWN_REQUEST_ID: HeaderValue = HeaderValue::from_static("unknown");

/// Middleware unit that guarantees every request and response carries an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestId;

impl RequestId {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestId {
    fn handle(&self, mut request: Request<Body>, next: Next) -> Eventual {
        let request_id = extract_or_generate_request_id(&request);
        debug!(request_id = %request_id, "Processing request");

        let value = HeaderValue::from_str(&request_id)
            .unwrap_or_else(|_| UNKNOWN_REQUEST_ID.clone());

        // Downstream units and the terminal can read it back via RequestIdExt
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value.clone());

        async move {
            let response = next.run(request).await?;
            Ok(response.with_header(REQUEST_ID_HEADER, value))
        }
        .boxed()
    }
}

/// Extract request ID from headers or generate a new one.
fn extract_or_generate_request_id<B>(req: &Request<B>) -> String {
    if let Some(header_value) = req.headers().get(&REQUEST_ID_HEADER)
        && let Ok(value) = header_value.to_str()
        && !value.is_empty()
    {
        return value.to_string();
    }

    Uuid::new_v4().to_string()
}

/// Extension trait to extract request ID from requests.
pub trait RequestIdExt {
    /// Get the request ID from the request headers.
    fn request_id(&self) -> Option<String>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<String> {
        self.headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
}
