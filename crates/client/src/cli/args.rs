pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

use client::config::BenchSettings;

#[derive(Parser, Debug)]
#[command(name = "ndnx")]
#[command(about = "Time asset retrieval over direct, CDN, relayed and named-data paths")]
pub struct Args {
    /// Path to a bench.toml
    #[arg(long, global = true, env = "NDNX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: crate::Command,
}

/// Settings that take precedence over the config file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    #[arg(long, global = true, env = "NDNX_RELAY_URL")]
    pub relay_url: Option<Url>,

    #[arg(long, global = true, env = "NDNX_ORIGIN_URL")]
    pub origin_url: Option<Url>,

    #[arg(long, global = true, env = "NDNX_CDN_URL")]
    pub cdn_url: Option<Url>,

    #[arg(long, global = true, env = "NDNX_CDN_BASE_URL")]
    pub cdn_base_url: Option<Url>,

    /// Asset identifier to resolve for the indirection strategy
    #[arg(long, global = true, env = "NDNX_ASSET")]
    pub asset: Option<String>,

    #[arg(long, global = true, env = "NDNX_TUNNEL_KEY", hide_env_values = true)]
    pub tunnel_key: Option<String>,

    #[arg(long, global = true, env = "NDNX_CONTENT_KEY", hide_env_values = true)]
    pub content_key: Option<String>,

    #[arg(long, global = true, env = "NDNX_ASSET_KEY", hide_env_values = true)]
    pub asset_key: Option<String>,

    #[arg(long, global = true, env = "NDNX_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
}

impl From<OverrideArgs> for BenchSettings {
    fn from(args: OverrideArgs) -> Self {
        BenchSettings {
            relay_url: args.relay_url,
            origin_url: args.origin_url,
            cdn_url: args.cdn_url,
            cdn_base_url: args.cdn_base_url,
            asset: args.asset,
            tunnel_key: args.tunnel_key,
            content_key: args.content_key,
            asset_key: args.asset_key,
            request_timeout_ms: args.request_timeout_ms,
        }
    }
}
