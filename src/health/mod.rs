//! Dependency health aggregation.
//!
//! A [`HealthChecker`] runs each registered [`Probe`] in turn, collects the
//! resulting [`ComponentStatus`] values into a [`HealthReport`], and derives the
//! overall status from them by severity: DOWN outranks WARNING, which outranks UP.

mod checker;
pub mod probes;
mod report;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use checker::HealthChecker;
pub use probes::{Probe, ProbeError, ProbeResult};
pub use report::{HealthReport, RESPONSE_TIME_COMPONENT};

/// Health of a single component or of the service as a whole.
///
/// Variants are declared in order of increasing severity, so `Ord` gives
/// the precedence used for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Warning,
    Down,
}

impl Status {
    /// Limit severity to `ceiling`.
    pub fn capped_at(self, ceiling: Status) -> Status {
        self.min(ceiling)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Up => "UP",
            Status::Warning => "WARNING",
            Status::Down => "DOWN",
        })
    }
}

/// Result of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            response_time: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_response_time(mut self, elapsed: Duration) -> Self {
        self.response_time = Some(format_duration(elapsed));
        self
    }
}

/// Render a duration the way `Debug` does (`850ns`, `12.5µs`, `1.234ms`, `2.5s`).
pub fn format_duration(duration: Duration) -> String {
    format!("{duration:?}")
}
