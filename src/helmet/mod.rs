//! Helmet-style security headers.
//!
//! [`Helmet`] is a middleware unit built from a [`HelmetOptions`] bag. The
//! options are resolved once, at construction, into an ordered
//! [`ResolvedRuleSet`]; each request then awaits the downstream response and
//! folds the rules over it.
//!
//! ```rust
//! use helmet_pipeline::helmet::{Helmet, HelmetOptions};
//!
//! let options = HelmetOptions::from_json_str(r#"{ "frameguard": { "action": "deny" } }"#)?;
//! let helmet = Helmet::new(&options)?;
//! assert_eq!(helmet.rules().len(), 13);
//! # Ok::<(), helmet_pipeline::ConfigError>(())
//! ```

pub mod csp;
pub mod layer;
pub mod options;
pub mod resolver;
pub mod rules;

pub use layer::{HelmetLayer, HelmetService};
pub use options::{Directive, HelmetOptions, Override, RuleSetting, Tokens};
pub use resolver::{ResolvedRuleSet, resolve};
pub use rules::{FrameAction, HeaderRule, RuleKind};

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use futures_util::FutureExt;
use tracing::debug;

use crate::error::ConfigResult;
use crate::pipeline::{Eventual, Middleware, Next};

/// Middleware unit applying security headers to the downstream response.
///
/// Cloning is cheap; clones share the same rule set.
#[derive(Debug, Clone)]
pub struct Helmet {
    rules: Arc<ResolvedRuleSet>,
}

impl Helmet {
    /// Resolve `options` into a unit.
    ///
    /// Fails on conflicting alias keys or values that cannot become header
    /// values; no unit is produced in that case.
    pub fn new(options: &HelmetOptions) -> ConfigResult<Self> {
        let rules = resolve(options)?;
        debug!(rules = ?rules.kinds(), "Resolved helmet rule set");

        Ok(Self {
            rules: Arc::new(rules),
        })
    }

    pub fn rules(&self) -> &ResolvedRuleSet {
        &self.rules
    }

    /// Tower layer sharing this unit's rule set.
    pub fn layer(&self) -> HelmetLayer {
        HelmetLayer::new(Arc::clone(&self.rules))
    }
}

impl Middleware for Helmet {
    fn handle(&self, request: Request<Body>, next: Next) -> Eventual {
        let rules = Arc::clone(&self.rules);

        async move {
            let response = next.run(request).await?;
            Ok(rules.apply(response))
        }
        .boxed()
    }
}
