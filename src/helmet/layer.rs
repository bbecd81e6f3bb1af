//! Tower adapter for a resolved rule set.
//!
//! Lets the same rules harden an ordinary axum `Router` without going
//! through a [`MiddlewareChain`](crate::pipeline::MiddlewareChain):
//!
//! ```rust,ignore
//! let router = Router::new()
//!     .route("/health", get(health_check))
//!     .route_layer(helmet.layer());
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use super::resolver::ResolvedRuleSet;

/// Layer applying a rule set to every response of the wrapped service.
#[derive(Debug, Clone)]
pub struct HelmetLayer {
    rules: Arc<ResolvedRuleSet>,
}

impl HelmetLayer {
    pub fn new(rules: Arc<ResolvedRuleSet>) -> Self {
        Self { rules }
    }
}

impl<S> Layer<S> for HelmetLayer {
    type Service = HelmetService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HelmetService {
            inner,
            rules: Arc::clone(&self.rules),
        }
    }
}

/// Service produced by [`HelmetLayer`].
#[derive(Debug, Clone)]
pub struct HelmetService<S> {
    inner: S,
    rules: Arc<ResolvedRuleSet>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HelmetService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness; leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let rules = Arc::clone(&self.rules);

        Box::pin(async move {
            let response = inner.call(req).await?;
            Ok(rules.apply(response))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::helmet::options::HelmetOptions;
    use crate::helmet::resolver::resolve;
    use crate::helmet::rules::X_POWERED_BY;
    use crate::response::ResponseExt;
    use axum::body::Body;
    use axum::http::header;
    use std::convert::Infallible;
    use tower::{ServiceBuilder, ServiceExt, service_fn};

    #[tokio::test]
    async fn test_layer_hardens_inner_responses() {
        let rules = Arc::new(resolve(&HelmetOptions::default()).unwrap());

        let service = ServiceBuilder::new()
            .layer(HelmetLayer::new(rules))
            .service(service_fn(|_req: Request<Body>| async {
                let response = Response::builder()
                    .header("x-powered-by", "PHP/8.3")
                    .body(Body::from("ok"))
                    .unwrap();
                Ok::<_, Infallible>(response)
            }));

        let response = service
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();

        assert!(!response.has_header(&X_POWERED_BY));
        assert_eq!(response.header_str(&header::SERVER), Some("secure"));
        assert_eq!(
            response.header_str(&header::X_CONTENT_TYPE_OPTIONS),
            Some("nosniff")
        );
    }
}
