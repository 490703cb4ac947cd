use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{format_duration, ComponentStatus, Status};

/// Key of the synthetic entry holding total check duration.
pub const RESPONSE_TIME_COMPONENT: &str = "responseTime";

/// Compiler version baked in by the build script.
const RUNTIME_VERSION: &str = env!("RUSTC_VERSION");

/// Snapshot of service health for one request.
///
/// The overall status is only ever derived from recorded components; there
/// is no way to set it directly.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    status: Status,
    time: DateTime<Utc>,
    // Existing dashboards key on this name.
    #[serde(rename = "goVersion")]
    runtime_version: &'static str,
    environment: String,
    components: BTreeMap<String, ComponentStatus>,
}

impl HealthReport {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            status: Status::Up,
            time: Utc::now(),
            runtime_version: RUNTIME_VERSION,
            environment: environment.into(),
            components: BTreeMap::new(),
        }
    }

    /// Record a probe result.
    ///
    /// A required component can take the service DOWN; an optional one at
    /// worst degrades it to WARNING.
    pub fn record(&mut self, name: &str, component: ComponentStatus, required: bool) {
        let contribution = if required {
            component.status
        } else {
            component.status.capped_at(Status::Warning)
        };
        self.status = self.status.max(contribution);
        self.components.insert(name.to_string(), component);
    }

    /// Add the synthetic total-duration entry. Does not affect the status.
    pub fn finish(&mut self, elapsed: Duration) {
        self.components.insert(
            RESPONSE_TIME_COMPONENT.to_string(),
            ComponentStatus::new(Status::Up).with_message(format_duration(elapsed)),
        );
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn component(&self, name: &str) -> Option<&ComponentStatus> {
        self.components.get(name)
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, &ComponentStatus)> {
        self.components.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// 503 when DOWN so load balancers drain the instance; 200 otherwise.
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            Status::Down => StatusCode::SERVICE_UNAVAILABLE,
            Status::Up | Status::Warning => StatusCode::OK,
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 3] = [Status::Up, Status::Warning, Status::Down];

    fn report_with(database: Status, cache: Status, disk: Status) -> HealthReport {
        let mut report = HealthReport::new("test");
        report.record("database", ComponentStatus::new(database), true);
        report.record("redis", ComponentStatus::new(cache), true);
        report.record("disk", ComponentStatus::new(disk), false);
        report
    }

    #[test]
    fn test_overall_status_for_every_combination() {
        for database in ALL {
            for cache in ALL {
                for disk in ALL {
                    let report = report_with(database, cache, disk);
                    let expected = if database == Status::Down || cache == Status::Down {
                        Status::Down
                    } else if [database, cache, disk].contains(&Status::Warning)
                        || disk == Status::Down
                    {
                        Status::Warning
                    } else {
                        Status::Up
                    };
                    assert_eq!(
                        report.status(),
                        expected,
                        "database={database} cache={cache} disk={disk}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_http_status_is_503_only_when_down() {
        for database in ALL {
            for cache in ALL {
                let report = report_with(database, cache, Status::Up);
                let expected = if report.status() == Status::Down {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::OK
                };
                assert_eq!(report.http_status(), expected);
            }
        }
    }

    #[test]
    fn test_healthy_cache_does_not_take_service_down() {
        let report = report_with(Status::Up, Status::Up, Status::Up);
        assert_eq!(report.status(), Status::Up);
    }

    #[test]
    fn test_later_warning_does_not_mask_down() {
        let report = report_with(Status::Down, Status::Up, Status::Warning);
        assert_eq!(report.status(), Status::Down);
    }

    #[test]
    fn test_empty_report_is_up() {
        let report = HealthReport::new("test");
        assert_eq!(report.status(), Status::Up);
        assert_eq!(report.components().count(), 0);
    }

    #[test]
    fn test_finish_adds_response_time_without_changing_status() {
        let mut report = report_with(Status::Up, Status::Up, Status::Warning);
        report.finish(Duration::from_millis(12));

        assert_eq!(report.status(), Status::Warning);
        let entry = report.component(RESPONSE_TIME_COMPONENT).unwrap();
        assert_eq!(entry.status, Status::Up);
        assert_eq!(entry.message.as_deref(), Some("12ms"));
    }

    #[test]
    fn test_serialized_shape() {
        let mut report = HealthReport::new("staging");
        report.record(
            "database",
            ComponentStatus::new(Status::Up).with_message("ok"),
            true,
        );
        report.finish(Duration::from_millis(1));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "UP");
        assert_eq!(json["environment"], "staging");
        assert_eq!(json["goVersion"], RUNTIME_VERSION);
        assert!(json["time"].as_str().unwrap().parse::<DateTime<Utc>>().is_ok());
        assert_eq!(json["components"]["database"]["message"], "ok");
        assert_eq!(json["components"]["responseTime"]["status"], "UP");
    }

    #[test]
    fn test_runtime_version_names_compiler() {
        assert!(RUNTIME_VERSION.starts_with("rustc"));
    }
}
