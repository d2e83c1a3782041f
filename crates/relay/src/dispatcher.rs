//! Relay Dispatcher
//!
//! One pass through the state machine per inbound request:
//!
//! ```text
//! Received --open(tunnel)--> Decoded --decode--> Dispatching --> Responding
//!     |                         |                    |
//!     +--> Rejected             +--> Rejected        +--> sealed failure / miss
//! ```
//!
//! Every terminal state produces a [`RelayReply`] sealed under the tunnel key. The only way
//! `handle_*` can fail is if sealing the reply itself fails.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use url::Url;

use common::content_key::{AssetIdentifier, ContentKeySource, ResolverError};
use common::crypto::{CipherChannel, CipherError, DecryptionError, KeyDomain, SealedToken};
use common::protocol::{ProtocolDecodeError, RejectKind, RelayReply, RoutingInstruction};

use crate::config::{DispatchPolicy, RelayKeys, RelayTargets};
use crate::fetch::{FetchError, Fetcher};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decryption(#[from] DecryptionError),
    #[error(transparent)]
    ProtocolDecode(#[from] ProtocolDecodeError),
    #[error("content identifier is not utf-8")]
    IdentifierEncoding,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error("downstream call timed out after {0:?}")]
    Timeout(Duration),
}

impl DispatchError {
    /// Decryption faults are permanent; only transport hiccups are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Fetch(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The sealed answer the client receives for this failure
    pub fn reply(&self) -> RelayReply {
        match self {
            DispatchError::Decryption(_) => RelayReply::Rejected(RejectKind::Decryption),
            DispatchError::ProtocolDecode(_) | DispatchError::IdentifierEncoding => {
                RelayReply::Rejected(RejectKind::ProtocolDecode)
            }
            DispatchError::Fetch(_) | DispatchError::Resolver(_) | DispatchError::Timeout(_) => {
                RelayReply::TransportFailure(self.to_string())
            }
        }
    }
}

/// Stateless request handler shared by every in-flight request
#[derive(Clone)]
pub struct Dispatcher {
    tunnel: CipherChannel,
    content_identifier: CipherChannel,
    targets: Arc<RelayTargets>,
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn ContentKeySource>,
    policy: DispatchPolicy,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tunnel", &self.tunnel)
            .field("content_identifier", &self.content_identifier)
            .field("targets", &self.targets)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        keys: RelayKeys,
        targets: RelayTargets,
        fetcher: Arc<dyn Fetcher>,
        resolver: Arc<dyn ContentKeySource>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            tunnel: CipherChannel::new(KeyDomain::Tunnel, keys.tunnel),
            content_identifier: CipherChannel::new(
                KeyDomain::ContentIdentifier,
                keys.content_identifier,
            ),
            targets: Arc::new(targets),
            fetcher,
            resolver,
            policy,
        }
    }

    /// Key domains this dispatcher is able to open
    pub fn key_domains(&self) -> [KeyDomain; 2] {
        [self.tunnel.domain(), self.content_identifier.domain()]
    }

    /// Handle `GET /relay/tunnel?payload=<token>`
    pub async fn handle_tunnel(&self, payload: &str) -> Result<SealedToken, CipherError> {
        let reply = match self.open_instruction(payload) {
            Ok(instruction) => self.dispatch(instruction).await,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting tunnel request");
                e.reply()
            }
        };
        self.respond(reply)
    }

    /// Handle `GET /relay/resolve?content_key=<token>`
    ///
    /// Shortcut for a tunnel request carrying a `resolve` instruction: the content key arrives
    /// sealed under the content-identifier key only.
    pub async fn handle_resolve(&self, content_key: &str) -> Result<SealedToken, CipherError> {
        let reply = match SealedToken::from_urlsafe(content_key) {
            Ok(content_key) => {
                self.dispatch(RoutingInstruction::Resolve { content_key })
                    .await
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejecting resolve request");
                DispatchError::from(e).reply()
            }
        };
        self.respond(reply)
    }

    /// Received -> Decoded
    fn open_instruction(&self, payload: &str) -> Result<RoutingInstruction, DispatchError> {
        let token = SealedToken::from_urlsafe(payload)?;
        let plaintext = self.tunnel.open(&token)?;
        Ok(RoutingInstruction::decode(&plaintext)?)
    }

    /// Dispatching: run one instruction to completion or timeout
    pub async fn dispatch(&self, instruction: RoutingInstruction) -> RelayReply {
        let route = instruction.name();
        let result = match instruction {
            RoutingInstruction::Direct => self.fetch(&self.targets.origin_url).await,
            RoutingInstruction::Cdn => self.fetch(&self.targets.cdn_url).await,
            RoutingInstruction::Resolve { content_key } => self.resolve(&content_key).await,
        };

        match result {
            Ok(reply) => {
                tracing::info!(route, outcome = reply_outcome(&reply), "dispatched");
                reply
            }
            Err(e) => {
                tracing::warn!(route, error = %e, "dispatch failed");
                e.reply()
            }
        }
    }

    /// Responding
    fn respond(&self, reply: RelayReply) -> Result<SealedToken, CipherError> {
        self.tunnel.seal(&reply.encode())
    }

    async fn fetch(&self, url: &Url) -> Result<RelayReply, DispatchError> {
        let mut attempt = 0;
        let mut backoff = self.policy.retry_backoff;

        loop {
            let result = match timeout(self.policy.request_timeout, self.fetcher.fetch(url)).await
            {
                Ok(result) => result.map_err(DispatchError::from),
                Err(_) => Err(DispatchError::Timeout(self.policy.request_timeout)),
            };

            match result {
                Ok(bytes) => return Ok(RelayReply::Payload(bytes)),
                Err(e) if attempt < self.policy.fetch_retries && e.is_retryable() => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "transient fetch failure, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Open the content key under its own channel and look it up. The delivery token is passed
    /// back untouched.
    async fn resolve(&self, content_key: &SealedToken) -> Result<RelayReply, DispatchError> {
        let identifier = self.content_identifier.open(content_key)?;
        let identifier = String::from_utf8(identifier)
            .map(AssetIdentifier::new)
            .map_err(|_| DispatchError::IdentifierEncoding)?;

        match timeout(self.policy.request_timeout, self.resolver.resolve(&identifier)).await {
            Ok(Ok(Some(token))) => Ok(RelayReply::Payload(token.into_bytes())),
            Ok(Ok(None)) => Ok(RelayReply::NotFound),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(DispatchError::Timeout(self.policy.request_timeout)),
        }
    }
}

fn reply_outcome(reply: &RelayReply) -> &'static str {
    match reply {
        RelayReply::Payload(_) => "payload",
        RelayReply::NotFound => "not_found",
        RelayReply::TransportFailure(_) => "transport_failure",
        RelayReply::Rejected(_) => "rejected",
    }
}
