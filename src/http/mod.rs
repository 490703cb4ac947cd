//! HTTP server module.
//!
//! The server includes:
//! - Plain HTTP listener (TLS is terminated by the load balancer in front)
//! - Graceful shutdown on SIGTERM/SIGINT

mod server;
mod shutdown;

pub use server::{listen_addr, start_server, ServerError};
