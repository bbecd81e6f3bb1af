use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use super::{Eventual, Handler, Middleware, Next, guarded};

/// Ordered list of middleware units.
///
/// Insertion order is preserved exactly: no reordering and no
/// deduplication, even when the same unit type appears twice.
///
/// A chain on its own is also a [`Middleware`]: it uses the `next` it is
/// handed as its terminal, so chains nest inside other chains.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    units: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `unit` as the new innermost unit.
    pub fn with<M: Middleware>(mut self, unit: M) -> Self {
        self.units.push(Arc::new(unit));
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Compose the chain around `terminal` into a single callable.
    ///
    /// The terminal's output is only inspected when the pipeline runs, so an
    /// unsupported output surfaces as a rejected `Eventual` rather than a
    /// construction error.
    pub fn build<H: Handler>(&self, terminal: H) -> Pipeline {
        let terminal = Next::new(move |request| guarded(|| terminal.call(request)));

        Pipeline {
            entry: self.compose(terminal),
            depth: self.units.len(),
        }
    }

    /// Right fold: unit `i` receives the composition of units `i+1..` (or
    /// `terminal` for the last unit) as its `next`.
    fn compose(&self, terminal: Next) -> Next {
        self.units.iter().rev().fold(terminal, |next, unit| {
            let unit = Arc::clone(unit);
            Next::new(move |request| {
                let next = next.clone();
                guarded(|| unit.handle(request, next))
            })
        })
    }
}

impl Middleware for MiddlewareChain {
    fn handle(&self, request: Request<Body>, next: Next) -> Eventual {
        self.compose(next).run(request)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("units", &self.units.len())
            .finish()
    }
}

/// A chain composed around its terminal handler.
///
/// Cheap to clone; every clone shares the same composed continuations.
#[derive(Clone)]
pub struct Pipeline {
    entry: Next,
    depth: usize,
}

impl Pipeline {
    /// Run `request` through every unit and the terminal.
    pub fn call(&self, request: Request<Body>) -> Eventual {
        self.entry.clone().run(request)
    }

    /// Number of middleware units in front of the terminal.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
