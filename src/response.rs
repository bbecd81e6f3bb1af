//! Value-returning header operations on responses.
//!
//! Units never mutate a response they have borrowed. Each operation consumes
//! the response and hands back the derived one, so a chain of units composes
//! by threading ownership from the innermost unit outwards.
//!
//! Header names are case-insensitive (`HeaderName` is always lowercase).

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Response;

/// Extension trait with the header operations used by rules and units.
pub trait ResponseExt: Sized {
    /// Return the response with `name` set to `value`, replacing any
    /// existing values for that name.
    fn with_header(self, name: HeaderName, value: HeaderValue) -> Self;

    /// Return the response with every value for `name` removed.
    fn without_header(self, name: &HeaderName) -> Self;

    /// Whether at least one value is present for `name`.
    fn has_header(&self, name: &HeaderName) -> bool;

    /// First value for `name` as a string, if present and visible ASCII.
    fn header_str(&self, name: &HeaderName) -> Option<&str>;
}

impl<B> ResponseExt for Response<B> {
    fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers_mut().insert(name, value);
        self
    }

    fn without_header(mut self, name: &HeaderName) -> Self {
        self.headers_mut().remove(name);
        self
    }

    fn has_header(&self, name: &HeaderName) -> bool {
        self.headers().contains_key(name)
    }

    fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}
