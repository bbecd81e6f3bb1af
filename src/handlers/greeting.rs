//! Terminal handler of the demo pipeline.

use axum::body::Body;
use axum::http::header::{self, HeaderValue};
use axum::http::{Request, Response};

pub const GREETING: &str = "Hello from HP Helmet\n";

/// Plain-text greeting for every request that reaches the dispatcher.
///
/// Advertises `X-Powered-By` so the helmet unit has something to strip.
pub fn greeting(_request: Request<Body>) -> Response<Body> {
    let mut response = Response::new(Body::from(GREETING));

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        "x-powered-by",
        HeaderValue::from_static(concat!("helmet_pipeline/", env!("CARGO_PKG_VERSION"))),
    );

    response
}
