use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use common::crypto::{ensure_distinct, KeyConfigError, KeyDomain, LinkToken, SymmetricKey};

/// Default per-request timeout for downstream calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// First retry delay; doubles on every further attempt
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// The two keys the relay is provisioned with
///
/// Holds no asset key.
#[derive(Debug, Clone)]
pub struct RelayKeys {
    pub tunnel: SymmetricKey,
    pub content_identifier: SymmetricKey,
}

impl RelayKeys {
    pub fn new(
        tunnel: SymmetricKey,
        content_identifier: SymmetricKey,
    ) -> Result<Self, KeyConfigError> {
        ensure_distinct(&[
            (KeyDomain::Tunnel, &tunnel),
            (KeyDomain::ContentIdentifier, &content_identifier),
        ])?;
        Ok(Self {
            tunnel,
            content_identifier,
        })
    }

    /// Parse both keys from url-safe base64
    pub fn from_base64(tunnel: &str, content_identifier: &str) -> Result<Self, KeyConfigError> {
        let tunnel = SymmetricKey::from_base64(tunnel)
            .map_err(|e| KeyConfigError::Invalid(KeyDomain::Tunnel, e))?;
        let content_identifier = SymmetricKey::from_base64(content_identifier)
            .map_err(|e| KeyConfigError::Invalid(KeyDomain::ContentIdentifier, e))?;
        Self::new(tunnel, content_identifier)
    }
}

/// Where `direct` and `cdn` instructions fetch from
#[derive(Debug, Clone)]
pub struct RelayTargets {
    pub origin_url: Url,
    pub cdn_url: Url,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy {
    /// Bound on every downstream call (fetch attempt or resolver lookup)
    pub request_timeout: Duration,
    /// Extra attempts for transient fetch failures. Zero disables retries.
    pub fetch_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch_retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub keys: RelayKeys,
    pub targets: RelayTargets,
    /// Base URL of the content key resolver
    pub resolver_url: Url,
    /// Token presented to the resolver, if it requires one
    pub link_token: Option<LinkToken>,
    pub policy: DispatchPolicy,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_keys_must_differ() {
        let key = SymmetricKey::generate().unwrap();
        assert!(matches!(
            RelayKeys::new(key.clone(), key),
            Err(KeyConfigError::SharedKey(
                KeyDomain::Tunnel,
                KeyDomain::ContentIdentifier
            ))
        ));
    }

    #[test]
    fn test_relay_keys_from_base64() {
        let tunnel = SymmetricKey::generate().unwrap();
        let content = SymmetricKey::generate().unwrap();

        let keys = RelayKeys::from_base64(&tunnel.to_base64(), &content.to_base64()).unwrap();
        assert_eq!(keys.tunnel, tunnel);
        assert_eq!(keys.content_identifier, content);

        assert!(matches!(
            RelayKeys::from_base64("short", &content.to_base64()),
            Err(KeyConfigError::Invalid(KeyDomain::Tunnel, _))
        ));
    }
}
