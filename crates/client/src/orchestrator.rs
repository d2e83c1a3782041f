//! Strategy execution and timing
//!
//! The [`Orchestrator`] owns one HTTP client and the client's [`ChannelSet`]. Each
//! [`Strategy`] is a short request chain; the orchestrator starts a monotonic clock, runs
//! the chain, and stops the clock only when the chain yields the asset bytes. Any non-2xx
//! status or failed open aborts the chain and becomes a [`StrategyError`].

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Client;
use url::Url;

use common::content_key::{AssetIdentifier, DeliveryToken};
use common::crypto::{ChannelSet, CipherError, DecryptionError, SealedToken};
use common::protocol::{
    ProtocolDecodeError, RejectKind, RelayReply, RoutingInstruction, NO_CACHE_HEADERS,
};

use crate::report::StrategyReport;
use crate::strategy::Strategy;

const TUNNEL_PATH: &str = "relay/tunnel";
const RESOLVE_PATH: &str = "relay/resolve";

/// Where each hop lives
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub relay_url: Url,
    pub origin_url: Url,
    pub cdn_url: Url,
    /// Delivery tokens are appended to this as a path suffix
    pub cdn_base_url: Url,
}

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
    #[error("no delivery token provisioned for the requested asset")]
    ResolutionMiss,
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    ProtocolDecode(#[from] ProtocolDecodeError),
    #[error("delivery token is not a valid path suffix")]
    InvalidDeliveryToken,
    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: Url, status: u16 },
    #[error("relay rejected the request: {0}")]
    Rejected(RejectKind),
    #[error(transparent)]
    Seal(#[from] CipherError),
}

impl StrategyError {
    /// Stable name reported alongside the failed strategy
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyError::Decryption(_) => "decryption",
            StrategyError::ResolutionMiss => "resolution_miss",
            StrategyError::Transport(_) | StrategyError::Seal(_) => "transport",
            StrategyError::ProtocolDecode(_) | StrategyError::InvalidDeliveryToken => {
                "protocol_decode"
            }
            StrategyError::HttpStatus { .. } => "http_status",
            StrategyError::Rejected(_) => "rejected",
        }
    }
}

impl From<reqwest::Error> for StrategyError {
    fn from(err: reqwest::Error) -> Self {
        StrategyError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for StrategyError {
    fn from(err: url::ParseError) -> Self {
        StrategyError::Transport(format!("invalid url: {}", err))
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: Client,
    endpoints: Endpoints,
    channels: ChannelSet,
    asset: AssetIdentifier,
}

impl Orchestrator {
    pub fn new(
        mut endpoints: Endpoints,
        channels: ChannelSet,
        asset: AssetIdentifier,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        endpoints.relay_url = with_trailing_slash(endpoints.relay_url);
        Ok(Self {
            client,
            endpoints,
            channels,
            asset,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Time one run of `strategy`
    pub async fn run(&self, strategy: Strategy, run: u32) -> StrategyReport {
        let start = Instant::now();
        match self.execute(strategy).await {
            Ok(bytes) => {
                let elapsed = start.elapsed();
                tracing::debug!(%strategy, run, ?elapsed, bytes = bytes.len(), "strategy completed");
                StrategyReport::success(strategy, run, elapsed, bytes.len())
            }
            Err(e) => {
                tracing::warn!(%strategy, run, kind = e.kind(), "strategy failed: {}", e);
                StrategyReport::failure(strategy, run, &e)
            }
        }
    }

    /// Run every strategy in `strategies`, `runs` times each, in order
    pub async fn run_all(&self, strategies: &[Strategy], runs: u32) -> Vec<StrategyReport> {
        let mut reports = Vec::with_capacity(strategies.len() * runs as usize);
        for &strategy in strategies {
            for run in 0..runs {
                reports.push(self.run(strategy, run).await);
            }
        }
        reports
    }

    /// Retrieve the asset bytes the way `strategy` does
    pub async fn execute(&self, strategy: Strategy) -> Result<Bytes, StrategyError> {
        match strategy {
            Strategy::Direct => self.get(self.endpoints.origin_url.clone()).await,
            Strategy::Cdn => self.get(self.endpoints.cdn_url.clone()).await,
            Strategy::VpnDirect => self.tunnel(&RoutingInstruction::Direct).await,
            Strategy::VpnCdn => self.tunnel(&RoutingInstruction::Cdn).await,
            Strategy::Indirection => self.indirection().await.map(Bytes::from),
        }
    }

    /// Send `instruction` through the relay's tunnel ingress
    pub async fn tunnel(&self, instruction: &RoutingInstruction) -> Result<Bytes, StrategyError> {
        let plaintext = instruction
            .encode()
            .map_err(|e| StrategyError::Transport(format!("failed to encode instruction: {}", e)))?;
        let sealed = self.channels.tunnel.seal(&plaintext)?;

        let mut url = self.endpoints.relay_url.join(TUNNEL_PATH)?;
        url.query_pairs_mut()
            .append_pair("payload", &sealed.to_urlsafe());

        let reply = self.relay_reply(url).await?;
        interpret(reply)
    }

    /// Steps 1 and 2 of the indirection exchange: the identifier goes out sealed under the
    /// content-identifier channel, the delivery token comes back sealed under the tunnel
    pub async fn resolve(&self, identifier: &AssetIdentifier) -> Result<DeliveryToken, StrategyError> {
        let content_key = self.channels.content_identifier.seal(identifier.as_bytes())?;

        let mut url = self.endpoints.relay_url.join(RESOLVE_PATH)?;
        url.query_pairs_mut()
            .append_pair("content_key", &content_key.to_urlsafe());

        let reply = self.relay_reply(url).await?;
        interpret(reply).map(DeliveryToken::from)
    }

    /// The full indirection exchange, ending with the asset plaintext
    pub async fn indirection(&self) -> Result<Vec<u8>, StrategyError> {
        let token = self.resolve(&self.asset).await?;
        let url = delivery_url(&self.endpoints.cdn_base_url, &token)?;

        let sealed_asset = self.get(url).await?;
        let plaintext = self
            .channels
            .asset
            .open(&SealedToken::from(sealed_asset.to_vec()))?;
        Ok(plaintext)
    }

    async fn relay_reply(&self, url: Url) -> Result<RelayReply, StrategyError> {
        let body = self.get(url).await?;
        let text = std::str::from_utf8(&body).map_err(|_| DecryptionError::Encoding)?;
        let sealed = SealedToken::from_urlsafe(text.trim())?;
        let plaintext = self.channels.tunnel.open(&sealed)?;
        Ok(RelayReply::decode(&plaintext)?)
    }

    async fn get(&self, url: Url) -> Result<Bytes, StrategyError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in NO_CACHE_HEADERS {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StrategyError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}

fn interpret(reply: RelayReply) -> Result<Bytes, StrategyError> {
    match reply {
        RelayReply::Payload(bytes) => Ok(bytes),
        RelayReply::NotFound => Err(StrategyError::ResolutionMiss),
        RelayReply::TransportFailure(reason) => Err(StrategyError::Transport(reason)),
        RelayReply::Rejected(kind) => Err(StrategyError::Rejected(kind)),
    }
}

/// Relay routes are joined relative to the relay's base path
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Append a delivery token to the CDN base url as a relative path suffix
///
/// Every `/`-separated segment must be non-empty and neither `.` nor `..`, so the token can
/// never climb out of the base path.
pub fn delivery_url(base: &Url, token: &DeliveryToken) -> Result<Url, StrategyError> {
    let suffix = token
        .as_path_suffix()
        .map_err(|_| StrategyError::InvalidDeliveryToken)?;
    let segments: Vec<&str> = suffix.split('/').collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(StrategyError::InvalidDeliveryToken);
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StrategyError::InvalidDeliveryToken)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
