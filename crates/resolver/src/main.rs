//! ndnx content key resolver
//!
//! Answers relay lookups for asset identifiers from a static table. Without `--table` the
//! single-entry experiment table is served.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use common::content_key::ContentKeyTable;
use common::crypto::LinkToken;
use resolver::{router, ResolverState};
use service::LogConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, env = "NDNX_RESOLVER_PORT", default_value = "8000")]
    port: u16,

    /// TOML file with an `[entries]` table of identifier = token
    #[arg(short, long, env = "NDNX_RESOLVER_TABLE")]
    table: Option<PathBuf>,

    /// Pre-shared token the relay must present
    #[arg(long, env = "NDNX_LINK_TOKEN", hide_env_values = true)]
    link_token: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let _guards = service::init_logging(&LogConfig {
        log_level,
        log_dir: args.log_dir,
        file_name: "ndnx-resolver.log",
    });

    tracing::info!("Starting ndnx content key resolver");

    let table = match args.table {
        Some(path) => ContentKeyTable::load(&path)?,
        None => ContentKeyTable::reference(),
    };
    if table.is_empty() {
        tracing::warn!("content key table is empty, every lookup will miss");
    }

    let link_token = args.link_token.map(LinkToken::new);
    if link_token.is_none() {
        tracing::warn!("no link token configured, lookups are unauthenticated");
    }

    let state = ResolverState::new(table, link_token);
    let listen_addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    service::run(listen_addr, router(state), log_level, common::build_info!()).await?;

    tracing::info!("Resolver shutdown complete");
    Ok(())
}
