//! Health Service
//!
//! HTTP endpoints reporting process liveness and the health of the service's
//! dependencies: a PostgreSQL database, a Redis cache and the local disk.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
