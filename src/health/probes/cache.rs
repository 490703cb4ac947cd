//! Redis probe.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::RedisResult;
use tokio::sync::OnceCell;

use super::{BoxError, Probe, ProbeError, ProbeResult};
use crate::config::CacheConfig;

#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn ping(&self) -> Result<(), BoxError>;
}

/// Long-lived Redis handle.
///
/// The connection is established on first use and reused afterwards, so the
/// service can start while Redis is unreachable and report it as DOWN. Each
/// connect is a single attempt; a refused connection fails the check at once.
pub struct RedisCache {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Validate the address and create the client. Does not connect.
    pub fn open(config: &CacheConfig) -> RedisResult<Self> {
        Ok(Self {
            client: redis::Client::open(config.url())?,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> RedisResult<ConnectionManager> {
        let client = self.client.clone();
        self.connection
            .get_or_try_init(|| async move {
                tracing::debug!("Establishing Redis connection");
                let config = ConnectionManagerConfig::new().set_number_of_retries(0);
                ConnectionManager::new_with_config(client, config).await
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl CacheClient for RedisCache {
    async fn ping(&self) -> Result<(), BoxError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

pub struct CacheProbe<C> {
    cache: C,
}

impl<C: CacheClient> CacheProbe<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<C: CacheClient> Probe for CacheProbe<C> {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> ProbeResult {
        self.cache
            .ping()
            .await
            .map_err(|e| ProbeError::Connection(format!("Failed to ping Redis: {e}")))?;
        Ok(None)
    }
}
