//! Relational database probe.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use super::{BoxError, Probe, ProbeError, ProbeResult};

/// Connection pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently open, idle or in use
    pub open: u32,
    /// Configured pool ceiling
    pub max: u32,
}

impl PoolStats {
    /// True once `open` reaches `ratio` of `max`.
    pub fn is_near_capacity(&self, ratio: f64) -> bool {
        self.max > 0 && f64::from(self.open) >= f64::from(self.max) * ratio
    }
}

/// The pool operations the probe needs.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    async fn ping(&self) -> Result<(), BoxError>;

    fn stats(&self) -> PoolStats;
}

#[async_trait]
impl DatabasePool for DatabaseConnection {
    async fn ping(&self) -> Result<(), BoxError> {
        DatabaseConnection::ping(self).await.map_err(Into::into)
    }

    /// Only Postgres pools expose statistics; other connections report an empty pool.
    fn stats(&self) -> PoolStats {
        match self {
            DatabaseConnection::SqlxPostgresPoolConnection(_) => {
                let pool = self.get_postgres_connection_pool();
                PoolStats {
                    open: pool.size(),
                    max: pool.options().get_max_connections(),
                }
            }
            _ => PoolStats { open: 0, max: 0 },
        }
    }
}

pub struct DatabaseProbe<P> {
    pool: P,
    warning_ratio: f64,
}

impl<P: DatabasePool> DatabaseProbe<P> {
    pub fn new(pool: P, warning_ratio: f64) -> Self {
        Self {
            pool,
            warning_ratio,
        }
    }
}

#[async_trait]
impl<P: DatabasePool> Probe for DatabaseProbe<P> {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> ProbeResult {
        self.pool
            .ping()
            .await
            .map_err(|e| ProbeError::Connection(format!("Failed to ping database: {e}")))?;

        let stats = self.pool.stats();
        if stats.is_near_capacity(self.warning_ratio) {
            return Err(ProbeError::ResourceExhaustion(format!(
                "High number of open connections: {}/{}",
                stats.open, stats.max
            )));
        }

        Ok(Some(format!(
            "Database connection pool open connections: {}/{}",
            stats.open, stats.max
        )))
    }
}
