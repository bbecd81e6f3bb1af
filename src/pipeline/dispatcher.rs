use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use futures_util::future::{BoxFuture, FutureExt};
use tower::Service;

use super::{Eventual, Handler, MiddlewareChain, Pipeline};
use crate::metrics;

/// Top-level chain of arbitrary middleware plus the terminal handler.
///
/// [`Dispatcher::dispatch`] exposes the raw failure channel. The
/// [`tower::Service`] implementation is the transport boundary: it turns
/// pipeline failures into sanitized `500` responses and records metrics,
/// which lets the dispatcher be mounted directly into an axum `Router`.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    pipeline: Pipeline,
}

impl Dispatcher {
    /// Compose `chain` around `terminal`.
    pub fn new<H: Handler>(chain: &MiddlewareChain, terminal: H) -> Self {
        Self {
            pipeline: chain.build(terminal),
        }
    }

    /// Run a request through the whole chain.
    pub fn dispatch(&self, request: Request<Body>) -> Eventual {
        self.pipeline.call(request)
    }

    /// Number of middleware units in front of the terminal.
    pub fn depth(&self) -> usize {
        self.pipeline.depth()
    }
}

impl Service<Request<Body>> for Dispatcher {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let started = Instant::now();
        let eventual = self.dispatch(request);

        async move {
            let response = match eventual.await {
                Ok(response) => response,
                Err(err) => {
                    metrics::record_pipeline_error(err.kind());
                    err.into_response()
                }
            };

            metrics::record_request(
                response.status().as_str(),
                started.elapsed().as_secs_f64(),
            );

            Ok(response)
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_dispatch_returns_terminal_response() {
        let dispatcher = Dispatcher::new(&MiddlewareChain::new(), |_req: Request<Body>| {
            Response::builder()
                .status(StatusCode::ACCEPTED)
                .body(Body::empty())
                .unwrap()
        });

        let response = dispatcher
            .dispatch(Request::new(Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_service_maps_failure_to_internal_error() {
        let dispatcher = Dispatcher::new(
            &MiddlewareChain::new(),
            |_req: Request<Body>| -> Result<Response<Body>, PipelineError> {
                Err(PipelineError::Handler("boom".to_string()))
            },
        );

        let response = dispatcher.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
