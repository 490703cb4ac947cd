use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{format_duration, ComponentStatus, HealthReport, Probe, ProbeError, Status};

/// Runs registered probes sequentially and aggregates their results.
///
/// Probes run in registration order, each bounded by the same timeout. The
/// checker holds no mutable state, so one instance serves all requests.
pub struct HealthChecker {
    probes: Vec<Arc<dyn Probe>>,
    probe_timeout: Duration,
    environment: String,
}

impl HealthChecker {
    pub fn new(environment: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            probes: Vec::new(),
            probe_timeout,
            environment: environment.into(),
        }
    }

    pub fn with_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Build a report by running every probe. Never fails.
    pub async fn check(&self) -> HealthReport {
        let start = Instant::now();
        let mut report = HealthReport::new(self.environment.as_str());

        for probe in &self.probes {
            let component = self.run(probe.as_ref()).await;
            report.record(probe.name(), component, probe.required());
        }

        let elapsed = start.elapsed();
        report.finish(elapsed);

        let response_time = format_duration(elapsed);
        match report.status() {
            Status::Up => {
                tracing::info!(status = %report.status(), %response_time, "Health check completed")
            }
            status => {
                tracing::warn!(%status, %response_time, "Health check completed")
            }
        }

        report
    }

    async fn run(&self, probe: &dyn Probe) -> ComponentStatus {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.probe_timeout, probe.check()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout)),
        };
        let elapsed = start.elapsed();

        match outcome {
            Ok(message) => {
                tracing::debug!(component = probe.name(), elapsed = ?elapsed, "Probe passed");
                let component = ComponentStatus::new(Status::Up).with_response_time(elapsed);
                match message {
                    Some(message) => component.with_message(message),
                    None => component,
                }
            }
            Err(e) => {
                tracing::warn!(component = probe.name(), error = %e, "Probe failed");
                ComponentStatus::new(e.status())
                    .with_response_time(elapsed)
                    .with_message(e.to_string())
            }
        }
    }
}
