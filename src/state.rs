//! Shared application state for request handlers.

use std::sync::Arc;

use crate::health::HealthChecker;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// The checker owns the long-lived database and Redis handles used by its
/// probes, so every request reuses the same connections.
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(checker: HealthChecker) -> Self {
        Self {
            checker: Arc::new(checker),
        }
    }
}
