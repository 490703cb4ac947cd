//! Dependency probes.
//!
//! Each probe checks one dependency through an injected, long-lived client
//! handle and reports either a healthy message or a [`ProbeError`]. Errors never
//! escape the probe boundary as request failures; the checker converts them
//! into a [`ComponentStatus`](super::ComponentStatus).

mod cache;
mod database;
mod disk;

use std::time::Duration;

use async_trait::async_trait;

use super::Status;

pub use cache::{CacheClient, CacheProbe, RedisCache};
pub use database::{DatabasePool, DatabaseProbe, PoolStats};
pub use disk::{DiskProbe, DiskStats, DiskUsage, SystemDisks};

/// Error type returned by dependency client handles.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// `Ok` carries an optional message for a healthy dependency.
pub type ProbeResult = Result<Option<String>, ProbeError>;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The dependency could not be reached or refused the check
    #[error("{0}")]
    Connection(String),

    /// The check did not complete within its bound
    #[error("Check timed out after {0:?}")]
    Timeout(Duration),

    /// The dependency answers but is close to running out of capacity
    #[error("{0}")]
    ResourceExhaustion(String),

    /// Usage statistics could not be read
    #[error("Failed to read statistics: {0}")]
    StatsUnavailable(String),
}

impl ProbeError {
    /// Status reported for a component that failed with this error.
    pub fn status(&self) -> Status {
        match self {
            ProbeError::Connection(_) | ProbeError::Timeout(_) => Status::Down,
            ProbeError::ResourceExhaustion(_) | ProbeError::StatsUnavailable(_) => Status::Warning,
        }
    }
}

/// A health check for one dependency.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Key under which the result appears in the report.
    fn name(&self) -> &'static str;

    /// Whether a DOWN result takes the whole service DOWN.
    fn required(&self) -> bool {
        true
    }

    async fn check(&self) -> ProbeResult;
}
