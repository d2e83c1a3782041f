//! Shared service infrastructure for the ndnx relay and resolver.
//!
//! This crate provides the plumbing both server binaries have in common:
//! - Logging setup (stdout + optional rolling file)
//! - Signal handling and graceful shutdown
//! - Health routes (`/_status/livez`, `/_status/readyz`, `/_status/version`)
//! - A JSON/plain-text not-found fallback
//! - Serving an axum router until shutdown

pub mod http;
pub mod process;

pub use http::{serve, HttpServerError, STATUS_PREFIX};
pub use process::{init_logging, run, LogConfig};
