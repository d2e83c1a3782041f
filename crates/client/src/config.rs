use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use common::content_key::{AssetIdentifier, REFERENCE_IDENTIFIER};
use common::crypto::{ChannelSet, KeyConfigError, KeyDomain, SymmetricKey};

use crate::orchestrator::Endpoints;

pub const DEFAULT_ORIGIN_URL: &str = "https://mirror.nforce.com/pub/speedtests/10mb.bin";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Keys(#[from] KeyConfigError),
}

/// Benchmark settings as written in `bench.toml` or given as flags.
///
/// Every field is optional so a file and a set of overrides can be layered with
/// [`BenchSettings::merge`] before [`BenchSettings::resolve`] checks what is required.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchSettings {
    pub relay_url: Option<Url>,
    pub origin_url: Option<Url>,
    pub cdn_url: Option<Url>,
    pub cdn_base_url: Option<Url>,
    pub asset: Option<String>,
    pub tunnel_key: Option<String>,
    pub content_key: Option<String>,
    pub asset_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub endpoints: Endpoints,
    pub asset: AssetIdentifier,
    pub channels: ChannelSet,
    pub request_timeout: Duration,
}

impl BenchSettings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Layer `overrides` on top of `self`; any value set in `overrides` wins
    pub fn merge(self, overrides: BenchSettings) -> BenchSettings {
        BenchSettings {
            relay_url: overrides.relay_url.or(self.relay_url),
            origin_url: overrides.origin_url.or(self.origin_url),
            cdn_url: overrides.cdn_url.or(self.cdn_url),
            cdn_base_url: overrides.cdn_base_url.or(self.cdn_base_url),
            asset: overrides.asset.or(self.asset),
            tunnel_key: overrides.tunnel_key.or(self.tunnel_key),
            content_key: overrides.content_key.or(self.content_key),
            asset_key: overrides.asset_key.or(self.asset_key),
            request_timeout_ms: overrides.request_timeout_ms.or(self.request_timeout_ms),
        }
    }

    pub fn resolve(self) -> Result<BenchConfig, ConfigError> {
        let relay_url = self.relay_url.ok_or(ConfigError::Missing("relay_url"))?;
        let origin_url = match self.origin_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_ORIGIN_URL)?,
        };
        let cdn_url = self.cdn_url.ok_or(ConfigError::Missing("cdn_url"))?;
        let cdn_base_url = self.cdn_base_url.ok_or(ConfigError::Missing("cdn_base_url"))?;

        let tunnel = parse_key(KeyDomain::Tunnel, self.tunnel_key, "tunnel_key")?;
        let content_identifier =
            parse_key(KeyDomain::ContentIdentifier, self.content_key, "content_key")?;
        let asset_key = parse_key(KeyDomain::Asset, self.asset_key, "asset_key")?;
        let channels = ChannelSet::new(tunnel, content_identifier, asset_key)?;

        let asset = AssetIdentifier::new(
            self.asset
                .unwrap_or_else(|| REFERENCE_IDENTIFIER.to_string()),
        );
        let request_timeout = Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        Ok(BenchConfig {
            endpoints: Endpoints {
                relay_url,
                origin_url,
                cdn_url,
                cdn_base_url,
            },
            asset,
            channels,
            request_timeout,
        })
    }
}

/// The asset key alone, for sealing objects destined for the CDN
pub fn asset_key(settings: &BenchSettings) -> Result<SymmetricKey, ConfigError> {
    parse_key(KeyDomain::Asset, settings.asset_key.clone(), "asset_key")
}

fn parse_key(
    domain: KeyDomain,
    encoded: Option<String>,
    name: &'static str,
) -> Result<SymmetricKey, ConfigError> {
    let encoded = encoded.ok_or(ConfigError::Missing(name))?;
    SymmetricKey::from_base64(&encoded)
        .map_err(|e| ConfigError::Keys(KeyConfigError::Invalid(domain, e)))
}
