//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file, then applies environment
//! variable overrides for the connection settings that deployments usually inject
//! (`DATABASE_URL`, `REDIS_ADDR`, `REDIS_PASSWORD`, `APP_ENV`). `AppConfig` is the
//! root configuration struct; every section falls back to defaults when omitted.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// HTTP Response Headers
// =============================================================================

/// Health responses describe the current instant and must never be cached
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

/// Response header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Health Check Defaults
// =============================================================================

/// Upper bound for a single probe in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

/// Fraction of the pool size at which the database is reported as WARNING
pub const DEFAULT_POOL_WARNING_RATIO: f64 = 0.9;

/// Disk usage percentage above which the disk is reported as WARNING
pub const DEFAULT_DISK_WARNING_PERCENT: f64 = 90.0;

/// Volume checked by the disk probe
pub const DEFAULT_DISK_PATH: &str = "/";

/// Maximum database pool size
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 100;

// =============================================================================
// Environment Overrides
// =============================================================================

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_REDIS_ADDR: &str = "REDIS_ADDR";
pub const ENV_REDIS_PASSWORD: &str = "REDIS_PASSWORD";
pub const ENV_APP_ENV: &str = "APP_ENV";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "health_service=info,sea_orm=warn,sqlx=warn";

/// Default deployment environment label
pub const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment label reported by the detailed health check
    #[serde(default = "AppConfig::default_environment")]
    pub environment: String,
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Relational database connection
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Redis connection
    #[serde(default)]
    pub cache: CacheConfig,
    /// Probe thresholds and bounds
    #[serde(default)]
    pub health: HealthSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    fn default_environment() -> String {
        DEFAULT_ENVIRONMENT.to_string()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[serde(default)]
    pub url: String,
    /// Maximum pool size (default: 100)
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: Self::default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    fn default_max_connections() -> u32 {
        DEFAULT_DB_MAX_CONNECTIONS
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Redis address as `host:port`
    #[serde(default)]
    pub addr: String,
    /// Optional Redis password
    pub password: Option<String>,
    /// Logical database index
    #[serde(default)]
    pub db: i64,
}

impl CacheConfig {
    /// Build a `redis://` URL, percent-encoding the password.
    pub fn url(&self) -> String {
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}/{}",
                urlencoding::encode(password),
                self.addr,
                self.db
            ),
            None => format!("redis://{}/{}", self.addr, self.db),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthSettings {
    /// Per-probe timeout in milliseconds (default: 2000)
    #[serde(default = "HealthSettings::default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Pool fill ratio that triggers WARNING (default: 0.9)
    #[serde(default = "HealthSettings::default_pool_warning_ratio")]
    pub pool_warning_ratio: f64,
    /// Path whose volume is checked (default: "/")
    #[serde(default = "HealthSettings::default_disk_path")]
    pub disk_path: String,
    /// Usage percentage that triggers WARNING (default: 90)
    #[serde(default = "HealthSettings::default_disk_warning_percent")]
    pub disk_warning_percent: f64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            probe_timeout_ms: Self::default_probe_timeout_ms(),
            pool_warning_ratio: Self::default_pool_warning_ratio(),
            disk_path: Self::default_disk_path(),
            disk_warning_percent: Self::default_disk_warning_percent(),
        }
    }
}

impl HealthSettings {
    fn default_probe_timeout_ms() -> u64 {
        DEFAULT_PROBE_TIMEOUT_MS
    }

    fn default_pool_warning_ratio() -> f64 {
        DEFAULT_POOL_WARNING_RATIO
    }

    fn default_disk_path() -> String {
        DEFAULT_DISK_PATH.to_string()
    }

    fn default_disk_warning_percent() -> f64 {
        DEFAULT_DISK_WARNING_PERCENT
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Text,
    /// Structured, one JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Load from a TOML file and apply process environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load from a TOML file, taking overrides from `lookup`.
    pub fn load_with<P, F>(path: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents, lookup)
    }

    /// Build from process environment alone, for deployments without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_toml_str("", |key| std::env::var(key).ok())
    }

    /// Parse TOML, apply overrides from `lookup` and validate.
    pub fn from_toml_str<F>(contents: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database.url = url;
        }
        if let Some(addr) = lookup(ENV_REDIS_ADDR) {
            self.cache.addr = addr;
        }
        if let Some(password) = lookup(ENV_REDIS_PASSWORD) {
            self.cache.password = Some(password);
        }
        if let Some(environment) = lookup(ENV_APP_ENV) {
            self.environment = environment;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.as_str();
        if url.is_empty() {
            return Err(ConfigError::Validation(format!(
                "database.url is not set (or set {ENV_DATABASE_URL})"
            )));
        }
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ConfigError::Validation(
                "database.url must be a postgres:// or postgresql:// URL".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.cache.addr.is_empty() {
            return Err(ConfigError::Validation(format!(
                "cache.addr is not set (or set {ENV_REDIS_ADDR})"
            )));
        }
        if self.health.probe_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "health.probe_timeout_ms must be greater than 0".to_string(),
            ));
        }
        let ratio = self.health.pool_warning_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "health.pool_warning_ratio must be in (0, 1], got {ratio}"
            )));
        }
        let percent = self.health.disk_warning_percent;
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(ConfigError::Validation(format!(
                "health.disk_warning_percent must be in (0, 100], got {percent}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [database]
        url = "postgres://app@localhost/app"

        [cache]
        addr = "localhost:6379"
    "#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL, no_env).unwrap();
        assert_eq!(config.environment, DEFAULT_ENVIRONMENT);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.database.max_connections, DEFAULT_DB_MAX_CONNECTIONS);
        assert_eq!(config.health.probe_timeout(), Duration::from_millis(2000));
        assert_eq!(config.health.pool_warning_ratio, 0.9);
        assert_eq!(config.health.disk_path, "/");
        assert_eq!(config.health.disk_warning_percent, 90.0);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            environment = "staging"

            [http]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgresql://app@db/app"
            max_connections = 20

            [cache]
            addr = "cache:6380"
            password = "secret"
            db = 2

            [health]
            probe_timeout_ms = 500
            pool_warning_ratio = 0.75
            disk_path = "/var/lib/app"
            disk_warning_percent = 80.0

            [logging]
            format = "json"
        "#;
        let config = AppConfig::from_toml_str(toml, no_env).unwrap();
        assert_eq!(config.environment, "staging");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.cache.db, 2);
        assert_eq!(config.health.probe_timeout(), Duration::from_millis(500));
        assert_eq!(config.health.disk_path, "/var/lib/app");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env = env_from(&[
            (ENV_DATABASE_URL, "postgres://override@db/app"),
            (ENV_REDIS_ADDR, "redis.internal:6379"),
            (ENV_REDIS_PASSWORD, "hunter2"),
            (ENV_APP_ENV, "production"),
        ]);
        let config = AppConfig::from_toml_str(MINIMAL, env).unwrap();
        assert_eq!(config.database.url, "postgres://override@db/app");
        assert_eq!(config.cache.addr, "redis.internal:6379");
        assert_eq!(config.cache.password.as_deref(), Some("hunter2"));
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_env_only_config() {
        let env = env_from(&[
            (ENV_DATABASE_URL, "postgres://app@db/app"),
            (ENV_REDIS_ADDR, "localhost:6379"),
        ]);
        let config = AppConfig::from_toml_str("", env).unwrap();
        assert_eq!(config.cache.addr, "localhost:6379");
        assert!(config.cache.password.is_none());
    }

    #[test]
    fn test_missing_database_url_rejected() {
        let toml = r#"
            [cache]
            addr = "localhost:6379"
        "#;
        let err = AppConfig::from_toml_str(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("database.url")));
    }

    #[test]
    fn test_non_postgres_url_rejected() {
        let env = env_from(&[(ENV_DATABASE_URL, "mysql://app@db/app")]);
        let err = AppConfig::from_toml_str(MINIMAL, env).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_cache_addr_rejected() {
        let toml = r#"
            [database]
            url = "postgres://app@localhost/app"
        "#;
        let err = AppConfig::from_toml_str(toml, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("cache.addr")));
    }

    #[test]
    fn test_out_of_range_thresholds_rejected() {
        for health in [
            "pool_warning_ratio = 0.0",
            "pool_warning_ratio = 1.5",
            "disk_warning_percent = 0.0",
            "disk_warning_percent = 101.0",
            "probe_timeout_ms = 0",
        ] {
            let toml = format!("{MINIMAL}\n[health]\n{health}\n");
            let err = AppConfig::from_toml_str(&toml, no_env).unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)), "{health} accepted");
        }
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let toml = r#"
            [database]
            url = "postgres://app@localhost/app"
            max_connections = 0

            [cache]
            addr = "localhost:6379"
        "#;
        assert!(AppConfig::from_toml_str(toml, no_env).is_err());
    }

    #[test]
    fn test_parse_error() {
        let err = AppConfig::from_toml_str("[database", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let toml = format!("{MINIMAL}\n[logging]\nformat = \"xml\"\n");
        assert!(matches!(
            AppConfig::from_toml_str(&toml, no_env),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = AppConfig::load_with(file.path(), no_env).unwrap();
        assert_eq!(config.database.url, "postgres://app@localhost/app");
        assert_eq!(config.cache.addr, "localhost:6379");
    }

    #[test]
    fn test_load_from_file_applies_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let env = env_from(&[(ENV_APP_ENV, "production")]);
        let config = AppConfig::load_with(file.path(), env).unwrap();
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load_with("/nonexistent/health-service.toml", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_cache_url_without_password() {
        let cache = CacheConfig {
            addr: "localhost:6379".to_string(),
            password: None,
            db: 0,
        };
        assert_eq!(cache.url(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_cache_url_empty_password_ignored() {
        let cache = CacheConfig {
            addr: "localhost:6379".to_string(),
            password: Some(String::new()),
            db: 1,
        };
        assert_eq!(cache.url(), "redis://localhost:6379/1");
    }

    #[test]
    fn test_cache_url_encodes_password() {
        let cache = CacheConfig {
            addr: "localhost:6379".to_string(),
            password: Some("p@ss/word".to_string()),
            db: 0,
        };
        assert_eq!(cache.url(), "redis://:p%40ss%2Fword@localhost:6379/0");
    }
}
