use serde::{Deserialize, Serialize};

use super::ProtocolDecodeError;
use crate::crypto::SealedToken;

/// What the relay should do with a tunnel request
///
/// Encoded as internally tagged JSON:
/// `{"route":"direct"}`, `{"route":"cdn"}` or
/// `{"route":"resolve","content_key":"<url-safe token>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RoutingInstruction {
    /// Fetch the configured origin URL
    Direct,
    /// Fetch the configured CDN URL
    Cdn,
    /// Resolve an asset identifier sealed under the content-identifier channel
    Resolve { content_key: SealedToken },
}

impl RoutingInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            RoutingInstruction::Direct => "direct",
            RoutingInstruction::Cdn => "cdn",
            RoutingInstruction::Resolve { .. } => "resolve",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolDecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
