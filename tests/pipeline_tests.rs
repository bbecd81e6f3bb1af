//! Composition tests for the generic middleware chain.
//!
//! Run with: `cargo test --test pipeline_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use futures_util::FutureExt;
use futures_util::future::Ready;
use helmet_pipeline::pipeline::{Eventual, Middleware, MiddlewareChain, Next};
use helmet_pipeline::{Dispatcher, PipelineError, PipelineResult};
use tower::ServiceExt;

type Log = Arc<Mutex<Vec<String>>>;

fn probe(name: &'static str, log: &Log) -> impl Middleware {
    let log = Arc::clone(log);
    move |req: Request<Body>, next: Next| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("{name}-enter"));
            let response = next.run(req).await?;
            log.lock().unwrap().push(format!("{name}-exit"));
            Ok::<_, PipelineError>(response)
        }
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[tokio::test]
async fn test_onion_ordering() {
    let log: Log = Arc::default();
    let terminal_log = Arc::clone(&log);

    let pipeline = MiddlewareChain::new()
        .with(probe("A", &log))
        .with(probe("B", &log))
        .with(probe("C", &log))
        .build(move |_req: Request<Body>| {
            terminal_log.lock().unwrap().push("terminal".to_string());
            Response::new(Body::empty())
        });

    pipeline.call(Request::new(Body::empty())).await.unwrap();

    assert_eq!(
        entries(&log).join(","),
        "A-enter,B-enter,C-enter,terminal,C-exit,B-exit,A-exit"
    );
}

#[tokio::test]
async fn test_async_terminal_is_awaited() {
    let pipeline = MiddlewareChain::new().build(|_req: Request<Body>| -> Eventual {
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Response::new(Body::from("late")))
        }
        .boxed()
    });

    let response = pipeline.call(Request::new(Body::empty())).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    assert_eq!(body, "late");
}

#[tokio::test]
async fn test_unsupported_terminal_output_is_type_mismatch() {
    let pipeline = MiddlewareChain::new().build(|_req: Request<Body>| -> Box<dyn Any + Send> {
        Box::new("not a response")
    });

    let err = pipeline.call(Request::new(Body::empty())).await.unwrap_err();

    assert!(matches!(err, PipelineError::TypeMismatch { .. }));
    assert_eq!(err.kind(), "type_mismatch");
}

#[tokio::test]
async fn test_type_mismatch_is_detected_on_invocation_not_construction() {
    let log: Log = Arc::default();

    // Building never inspects the terminal.
    let pipeline = MiddlewareChain::new()
        .with(probe("A", &log))
        .build(|_req: Request<Body>| -> Box<dyn Any + Send> { Box::new(7_u8) });
    assert!(entries(&log).is_empty());

    let result = pipeline.call(Request::new(Body::empty())).await;

    assert!(result.is_err());
    assert_eq!(entries(&log), ["A-enter"]);
}

#[tokio::test]
async fn test_boxed_response_terminal_is_accepted() {
    let pipeline = MiddlewareChain::new().build(|_req: Request<Body>| -> Box<dyn Any + Send> {
        Box::new(Response::new(Body::empty()))
    });

    let response = pipeline.call(Request::new(Body::empty())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_panicking_middle_unit_skips_remaining_exits() {
    let log: Log = Arc::default();

    let pipeline = MiddlewareChain::new()
        .with(probe("A", &log))
        .with(
            |_req: Request<Body>, _next: Next| -> Ready<PipelineResult<Response<Body>>> {
                panic!("unit exploded")
            },
        )
        .with(probe("C", &log))
        .build(|_req: Request<Body>| Response::new(Body::empty()));

    let err = pipeline.call(Request::new(Body::empty())).await.unwrap_err();

    assert_eq!(err, PipelineError::Panicked("unit exploded".to_string()));
    // A saw the rejection through `?` and never reached its exit.
    assert_eq!(entries(&log), ["A-enter"]);
}

#[tokio::test]
async fn test_dispatcher_service_turns_failures_into_500() {
    let chain = MiddlewareChain::new();
    let dispatcher = Dispatcher::new(&chain, |_req: Request<Body>| {
        Err::<Response<Body>, _>(PipelineError::Handler("database unavailable".to_string()))
    });

    let response = dispatcher
        .oneshot(Request::new(Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "handler_error");
    assert!(!json["message"].as_str().unwrap().contains("database"));
}

#[tokio::test]
async fn test_dropping_eventual_cancels_chain() {
    let log: Log = Arc::default();

    let pipeline = MiddlewareChain::new()
        .with(probe("A", &log))
        .build(|_req: Request<Body>| -> Eventual {
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Response::new(Body::empty()))
            }
            .boxed()
        });

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        pipeline.call(Request::new(Body::empty())),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(entries(&log), ["A-enter"]);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let pipeline = MiddlewareChain::new()
        .with(|req: Request<Body>, next: Next| async move {
            let path = req.uri().path().to_string();
            let mut response = next.run(req).await?;
            response
                .headers_mut()
                .insert("x-path", path.parse().unwrap());
            Ok::<_, PipelineError>(response)
        })
        .build(|_req: Request<Body>| Response::new(Body::empty()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                let request = Request::builder()
                    .uri(format!("/r/{i}"))
                    .body(Body::empty())
                    .unwrap();
                let response = pipeline.call(request).await.unwrap();
                (i, response.headers()["x-path"].to_str().unwrap().to_string())
            })
        })
        .collect();

    for handle in handles {
        let (i, path) = handle.await.unwrap();
        assert_eq!(path, format!("/r/{i}"));
    }
}
