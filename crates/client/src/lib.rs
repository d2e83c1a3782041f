//! ndnx edge client
//!
//! Drives each retrieval strategy end-to-end and times it:
//!
//! - `direct`: GET the origin
//! - `cdn`: GET the CDN
//! - `vpn-direct` / `vpn-cdn`: the same fetch, tunnelled through the relay
//! - `indirection`: resolve the asset identifier through the relay, fetch the delivery token
//!   from the CDN and open it under the asset key

pub mod config;
pub mod orchestrator;
pub mod report;
pub mod strategy;

pub use config::{BenchConfig, ConfigError};
pub use orchestrator::{Endpoints, Orchestrator, StrategyError};
pub use report::{Outcome, StrategyReport};
pub use strategy::Strategy;
