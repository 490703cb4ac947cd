//! Disk space probe.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sysinfo::Disks;

use super::{BoxError, Probe, ProbeError, ProbeResult};
use crate::config::HealthSettings;

/// Capacity of one volume in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub available: u64,
}

impl DiskUsage {
    /// Percentage of the volume in use, or `None` for a zero-sized volume.
    pub fn used_percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let used = self.total.saturating_sub(self.available);
        Some(used as f64 / self.total as f64 * 100.0)
    }
}

/// Filesystem statistics accessor.
pub trait DiskStats: Send + Sync {
    fn usage(&self, path: &Path) -> Result<DiskUsage, BoxError>;
}

/// Reads the mounted-disk table of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDisks;

impl DiskStats for SystemDisks {
    fn usage(&self, path: &Path) -> Result<DiskUsage, BoxError> {
        let disks = Disks::new_with_refreshed_list();
        // The volume holding `path` is the one with the longest matching mount point.
        let disk = disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| format!("no mounted volume contains {}", path.display()))?;

        Ok(DiskUsage {
            total: disk.total_space(),
            available: disk.available_space(),
        })
    }
}

pub struct DiskProbe {
    stats: Arc<dyn DiskStats>,
    path: PathBuf,
    warning_percent: f64,
}

impl DiskProbe {
    pub fn new(stats: impl DiskStats + 'static, settings: &HealthSettings) -> Self {
        Self {
            stats: Arc::new(stats),
            path: PathBuf::from(&settings.disk_path),
            warning_percent: settings.disk_warning_percent,
        }
    }
}

#[async_trait]
impl Probe for DiskProbe {
    fn name(&self) -> &'static str {
        "disk"
    }

    /// A full disk degrades the service but does not take it down.
    fn required(&self) -> bool {
        false
    }

    async fn check(&self) -> ProbeResult {
        let stats = Arc::clone(&self.stats);
        let path = self.path.clone();
        let usage = tokio::task::spawn_blocking(move || stats.usage(&path))
            .await
            .map_err(|e| ProbeError::StatsUnavailable(e.to_string()))?
            .map_err(|e| ProbeError::StatsUnavailable(e.to_string()))?;

        let percent = usage.used_percent().ok_or_else(|| {
            ProbeError::StatsUnavailable(format!("{} reports zero capacity", self.path.display()))
        })?;

        if percent > self.warning_percent {
            return Err(ProbeError::ResourceExhaustion(format!(
                "Disk usage is high: {percent:.1}%"
            )));
        }

        Ok(Some(format!("Disk usage: {percent:.1}%")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Status;

    struct FixedUsage(Result<DiskUsage, &'static str>);

    impl DiskStats for FixedUsage {
        fn usage(&self, _path: &Path) -> Result<DiskUsage, BoxError> {
            self.0.map_err(Into::into)
        }
    }

    fn probe_at(percent_used: u64) -> DiskProbe {
        let usage = DiskUsage {
            total: 100,
            available: 100 - percent_used,
        };
        DiskProbe::new(FixedUsage(Ok(usage)), &HealthSettings::default())
    }

    #[test]
    fn test_used_percent() {
        let usage = DiskUsage {
            total: 200,
            available: 50,
        };
        assert_eq!(usage.used_percent(), Some(75.0));
    }

    #[test]
    fn test_used_percent_zero_total() {
        let usage = DiskUsage {
            total: 0,
            available: 0,
        };
        assert_eq!(usage.used_percent(), None);
    }

    #[test]
    fn test_used_percent_clamps_inconsistent_stats() {
        let usage = DiskUsage {
            total: 100,
            available: 150,
        };
        assert_eq!(usage.used_percent(), Some(0.0));
    }

    #[tokio::test]
    async fn test_normal_usage_is_up() {
        let message = probe_at(60).check().await.unwrap();
        assert_eq!(message.as_deref(), Some("Disk usage: 60.0%"));
    }

    #[tokio::test]
    async fn test_threshold_itself_is_up() {
        assert!(probe_at(90).check().await.is_ok());
    }

    #[tokio::test]
    async fn test_high_usage_is_warning() {
        let err = probe_at(95).check().await.unwrap_err();
        assert_eq!(err.status(), Status::Warning);
        assert_eq!(err.to_string(), "Disk usage is high: 95.0%");
    }

    #[tokio::test]
    async fn test_unreadable_stats_is_warning() {
        let probe = DiskProbe::new(
            FixedUsage(Err("no mounted volume contains /data")),
            &HealthSettings::default(),
        );
        let err = probe.check().await.unwrap_err();
        assert_eq!(err.status(), Status::Warning);
        assert!(err.to_string().contains("no mounted volume contains /data"));
    }

    #[tokio::test]
    async fn test_zero_capacity_is_warning() {
        let usage = DiskUsage {
            total: 0,
            available: 0,
        };
        let probe = DiskProbe::new(FixedUsage(Ok(usage)), &HealthSettings::default());
        let err = probe.check().await.unwrap_err();
        assert!(matches!(err, ProbeError::StatsUnavailable(_)));
    }

    #[test]
    fn test_disk_is_optional() {
        assert!(!probe_at(10).required());
    }
}
