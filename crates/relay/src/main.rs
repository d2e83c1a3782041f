//! ndnx relay ("VPN") node
//!
//! Terminates the client's tunnel channel and dispatches each request to origin, CDN or the
//! content key resolver.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use url::Url;

use common::crypto::LinkToken;
use relay::fetch::HttpFetcher;
use relay::resolver_client::HttpResolverClient;
use relay::{router, Config, DispatchPolicy, Dispatcher, RelayKeys, RelayState, RelayTargets};
use service::LogConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, env = "NDNX_RELAY_PORT", default_value = "8000")]
    port: u16,

    /// Tunnel key (url-safe base64, 32 bytes)
    #[arg(long, env = "NDNX_TUNNEL_KEY", hide_env_values = true)]
    tunnel_key: String,

    /// Content-identifier key (url-safe base64, 32 bytes)
    #[arg(long, env = "NDNX_CONTENT_KEY", hide_env_values = true)]
    content_key: String,

    /// URL fetched for `direct` instructions
    #[arg(
        long,
        env = "NDNX_ORIGIN_URL",
        default_value = "https://mirror.nforce.com/pub/speedtests/10mb.bin"
    )]
    origin_url: Url,

    /// URL fetched for `cdn` instructions
    #[arg(long, env = "NDNX_CDN_URL")]
    cdn_url: Url,

    /// Base URL of the content key resolver
    #[arg(long, env = "NDNX_RESOLVER_URL")]
    resolver_url: Url,

    /// Pre-shared token presented to the resolver
    #[arg(long, env = "NDNX_LINK_TOKEN", hide_env_values = true)]
    link_token: Option<String>,

    /// Per-request timeout for downstream calls, in milliseconds
    #[arg(long, env = "NDNX_REQUEST_TIMEOUT_MS", default_value = "30000")]
    request_timeout_ms: u64,

    /// Extra attempts for transient fetch failures
    #[arg(long, env = "NDNX_FETCH_RETRIES", default_value = "0")]
    fetch_retries: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let keys = RelayKeys::from_base64(&self.tunnel_key, &self.content_key)?;
        Ok(Config {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], self.port)),
            keys,
            targets: RelayTargets {
                origin_url: self.origin_url,
                cdn_url: self.cdn_url,
            },
            resolver_url: self.resolver_url,
            link_token: self.link_token.map(LinkToken::new),
            policy: DispatchPolicy {
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                fetch_retries: self.fetch_retries,
                ..Default::default()
            },
            log_level: self.log_level.parse().unwrap_or(tracing::Level::INFO),
            log_dir: self.log_dir,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    let _guards = service::init_logging(&LogConfig {
        log_level: config.log_level,
        log_dir: config.log_dir.clone(),
        file_name: "ndnx-relay.log",
    });

    tracing::info!(
        origin = %config.targets.origin_url,
        cdn = %config.targets.cdn_url,
        resolver = %config.resolver_url,
        timeout_ms = config.policy.request_timeout.as_millis() as u64,
        retries = config.policy.fetch_retries,
        "Starting ndnx relay"
    );

    let fetcher = HttpFetcher::new(config.policy.request_timeout)?;
    let resolver = Arc::new(HttpResolverClient::new(
        &config.resolver_url,
        config.link_token.clone(),
        config.policy.request_timeout,
    )?);

    let dispatcher = Dispatcher::new(
        config.keys,
        config.targets,
        Arc::new(fetcher),
        resolver.clone(),
        config.policy,
    );

    let router = router(RelayState { dispatcher }, resolver);
    service::run(
        config.listen_addr,
        router,
        config.log_level,
        common::build_info!(),
    )
    .await?;

    tracing::info!("Relay shutdown complete");
    Ok(())
}
