//! Messages carried over the tunnel channel
//!
//! The client seals a [`RoutingInstruction`] under the tunnel key; the relay answers with a
//! tunnel-sealed [`RelayReply`]. Both decode strictly: an unknown route or reply status is a
//! [`ProtocolDecodeError`], never a silent default.

mod instruction;
mod reply;

pub use instruction::RoutingInstruction;
pub use reply::{RejectKind, RelayReply};

/// Request headers that disable intermediary caching, so timings reflect uncached retrieval
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

#[derive(Debug, thiserror::Error)]
pub enum ProtocolDecodeError {
    #[error("malformed routing instruction: {0}")]
    Instruction(#[from] serde_json::Error),
    #[error("empty relay reply")]
    EmptyReply,
    #[error("unknown relay reply status: {0:#04x}")]
    UnknownStatus(u8),
    #[error("relay reply body is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unknown reject kind: {0}")]
    UnknownRejectKind(String),
}
