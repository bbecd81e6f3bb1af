//! Async middleware composition.
//!
//! A middleware unit receives the request and a [`Next`] continuation and
//! returns an [`Eventual`] response. Units are chained around a terminal
//! [`Handler`] in "onion" order:
//!
//! ```text
//!   request ──▶ A ──▶ B ──▶ C ──▶ terminal
//!                                   │
//!   response ◀── A ◀── B ◀── C ◀────┘
//! ```
//!
//! Pre-`next` logic runs outermost-first, post-`next` logic innermost-first,
//! so the first unit in a chain has the final say on any header it writes.
//!
//! # Failure channel
//!
//! Every composed callable returns an [`Eventual`]. A unit that panics while
//! building or resolving its future is converted into
//! [`PipelineError::Panicked`] at the composition boundary, so callers never
//! observe an unwinding panic from deeper in the chain.
//!
//! # Cancellation
//!
//! Dropping an `Eventual` cancels the whole chain beneath it. Units only
//! touch the response after their `next` has resolved, so a cancelled request
//! never yields a partially hardened response.

mod chain;
mod dispatcher;

pub use chain::{MiddlewareChain, Pipeline};
pub use dispatcher::Dispatcher;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::error::{PipelineError, PipelineResult};

/// A response that becomes available later, or the reason it never will.
pub type Eventual = BoxFuture<'static, PipelineResult<Response<Body>>>;

/// A composable unit layered around a handler.
///
/// Implemented for any `Fn(Request<Body>, Next) -> impl Future` closure, so
/// ad-hoc units can be written inline:
///
/// ```rust
/// use helmet_pipeline::pipeline::{MiddlewareChain, Next};
/// use axum::body::Body;
/// use axum::http::Request;
///
/// let chain = MiddlewareChain::new().with(|req: Request<Body>, next: Next| async move {
///     let response = next.run(req).await?;
///     Ok::<_, helmet_pipeline::PipelineError>(response)
/// });
/// # let _ = chain;
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Handle `request`, deciding whether and when to invoke `next`.
    fn handle(&self, request: Request<Body>, next: Next) -> Eventual;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PipelineResult<Response<Body>>> + Send + 'static,
{
    fn handle(&self, request: Request<Body>, next: Next) -> Eventual {
        self(request, next).boxed()
    }
}

/// The rest of the chain, as seen from one unit.
#[derive(Clone)]
pub struct Next {
    inner: Arc<dyn Fn(Request<Body>) -> Eventual + Send + Sync>,
}

impl Next {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(Request<Body>) -> Eventual + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Pass `request` downstream and obtain the eventual response.
    pub fn run(self, request: Request<Body>) -> Eventual {
        (self.inner)(request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Terminal handler producing the base response.
///
/// Implemented for any `Fn(Request<Body>) -> R` where `R: IntoEventual`.
pub trait Handler: Send + Sync + 'static {
    /// Produce the base response for `request`.
    fn call(&self, request: Request<Body>) -> Eventual;
}

impl<F, R> Handler for F
where
    F: Fn(Request<Body>) -> R + Send + Sync + 'static,
    R: IntoEventual,
{
    fn call(&self, request: Request<Body>) -> Eventual {
        self(request).into_eventual()
    }
}

/// Normalization of whatever a terminal handler returns into an [`Eventual`].
///
/// Ready responses are wrapped into a completed `Eventual`; an `Eventual`
/// passes through untouched. `Box<dyn Any + Send>` covers handlers whose
/// return type is only known at run time: it is downcast on invocation and
/// anything that is neither shape becomes [`PipelineError::TypeMismatch`].
pub trait IntoEventual {
    fn into_eventual(self) -> Eventual;
}

impl IntoEventual for Response<Body> {
    fn into_eventual(self) -> Eventual {
        future::ready(Ok(self)).boxed()
    }
}

impl IntoEventual for PipelineResult<Response<Body>> {
    fn into_eventual(self) -> Eventual {
        future::ready(self).boxed()
    }
}

impl IntoEventual for Eventual {
    fn into_eventual(self) -> Eventual {
        self
    }
}

impl IntoEventual for Box<dyn Any + Send> {
    fn into_eventual(self) -> Eventual {
        let value = match self.downcast::<Response<Body>>() {
            Ok(response) => return response.into_eventual(),
            Err(value) => value,
        };

        match value.downcast::<Eventual>() {
            Ok(eventual) => *eventual,
            Err(_) => future::ready(Err(PipelineError::TypeMismatch {
                expected: "Response or Eventual<Response>",
                found: "unsupported handler output",
            }))
            .boxed(),
        }
    }
}

/// Run `f` and the future it returns with panics mapped onto the error
/// channel.
pub(crate) fn guarded<F>(f: F) -> Eventual
where
    F: FnOnce() -> Eventual,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(eventual) => AssertUnwindSafe(eventual)
            .catch_unwind()
            .map(|outcome| match outcome {
                Ok(result) => result,
                Err(payload) => Err(PipelineError::Panicked(panic_message(payload.as_ref()))),
            })
            .boxed(),
        Err(payload) => {
            future::ready(Err(PipelineError::Panicked(panic_message(payload.as_ref())))).boxed()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
