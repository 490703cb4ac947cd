use crate::config::ConfigError;
use crate::http::ServerError;

/// Failures that stop the service from starting or serving.
///
/// Request handlers never produce these; dependency failures are reported in
/// the health payload instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database setup error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Redis setup error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error(transparent)]
    Server(#[from] ServerError),
}
