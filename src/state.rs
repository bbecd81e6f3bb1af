//! Shared application state for Axum handlers.
//!
//! Everything here is immutable after startup; the helmet rule set sits
//! behind an `Arc`, so cloning the state per request needs no locking.

use std::time::Instant;

use crate::helmet::Helmet;

/// Shared application state for Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Resolved helmet unit, shared by the dispatcher and the health route
    pub helmet: Helmet,

    /// Application start time for uptime calculation
    started_at: Instant,
}

impl AppState {
    pub fn new(helmet: Helmet) -> Self {
        Self {
            helmet,
            started_at: Instant::now(),
        }
    }

    /// Get application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::helmet::HelmetOptions;

    #[test]
    fn test_state_clone_shares_rules() {
        let helmet = Helmet::new(&HelmetOptions::default()).unwrap();
        let state = AppState::new(helmet);
        let clone = state.clone();

        assert!(std::ptr::eq(state.helmet.rules(), clone.helmet.rules()));
        assert_eq!(state.uptime_seconds(), 0);
    }
}
