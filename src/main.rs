//! Health Service entry point.
//!
//! Loads configuration, initializes tracing, creates the long-lived database
//! and Redis handles, registers the dependency probes, and starts the HTTP server.

use std::path::Path;

use clap::Parser;
use sea_orm::{ConnectOptions, Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use health_service::config::{AppConfig, LogFormat, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use health_service::health::probes::{CacheProbe, DatabaseProbe, DiskProbe, RedisCache, SystemDisks};
use health_service::health::HealthChecker;
use health_service::routes::create_router;
use health_service::state::AppState;
use health_service::AppError;

/// Liveness and dependency health endpoints
#[derive(Parser, Debug)]
#[command(name = "health-service", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "health_service=debug")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // A missing default config file is fine; the environment can supply everything.
    let config = if args.config == DEFAULT_CONFIG_PATH && !Path::new(&args.config).exists() {
        AppConfig::from_env()?
    } else {
        AppConfig::load(&args.config)?
    };

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        config = %args.config,
        environment = %config.environment,
        "Loaded configuration"
    );

    // Connect lazily so the service starts (and reports DOWN) while the database is unreachable
    let probe_timeout = config.health.probe_timeout();
    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .connect_timeout(probe_timeout)
        .acquire_timeout(probe_timeout)
        .connect_lazy(true)
        .sqlx_logging(false);
    let database = Database::connect(options).await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "Initialized database pool"
    );

    let cache = RedisCache::open(&config.cache)?;
    tracing::info!(addr = %config.cache.addr, "Initialized Redis client");

    let checker = HealthChecker::new(config.environment.clone(), probe_timeout)
        .with_probe(DatabaseProbe::new(database, config.health.pool_warning_ratio))
        .with_probe(CacheProbe::new(cache))
        .with_probe(DiskProbe::new(SystemDisks, &config.health));
    tracing::info!(
        probes = ?checker.probe_names(),
        disk_path = %config.health.disk_path,
        "Registered health probes"
    );

    let app = create_router(AppState::new(checker));
    health_service::http::start_server(app, &config.http).await?;

    Ok(())
}
