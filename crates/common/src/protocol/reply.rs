use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use super::ProtocolDecodeError;

const STATUS_PAYLOAD: u8 = 0x00;
const STATUS_NOT_FOUND: u8 = 0x01;
const STATUS_TRANSPORT_FAILURE: u8 = 0x02;
const STATUS_REJECTED: u8 = 0x03;

/// Why the relay refused a tunnel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    Decryption,
    ProtocolDecode,
}

impl RejectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectKind::Decryption => "decryption",
            RejectKind::ProtocolDecode => "protocol_decode",
        }
    }
}

impl fmt::Display for RejectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectKind {
    type Err = ProtocolDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decryption" => Ok(RejectKind::Decryption),
            "protocol_decode" => Ok(RejectKind::ProtocolDecode),
            other => Err(ProtocolDecodeError::UnknownRejectKind(other.to_string())),
        }
    }
}

/// Plaintext of every tunnel-sealed relay response
///
/// Layout: one status byte followed by the body.
///
/// | status | body |
/// |---|---|
/// | `0x00` | fetched bytes or delivery token |
/// | `0x01` | empty, resolver miss |
/// | `0x02` | utf-8 reason |
/// | `0x03` | utf-8 [`RejectKind`] |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayReply {
    Payload(Bytes),
    NotFound,
    TransportFailure(String),
    Rejected(RejectKind),
}

impl RelayReply {
    pub fn encode(&self) -> Vec<u8> {
        let (status, body): (u8, &[u8]) = match self {
            RelayReply::Payload(bytes) => (STATUS_PAYLOAD, &bytes[..]),
            RelayReply::NotFound => (STATUS_NOT_FOUND, &b""[..]),
            RelayReply::TransportFailure(reason) => (STATUS_TRANSPORT_FAILURE, reason.as_bytes()),
            RelayReply::Rejected(kind) => (STATUS_REJECTED, kind.as_str().as_bytes()),
        };

        let mut out = Vec::with_capacity(1 + body.len());
        out.push(status);
        out.extend_from_slice(body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolDecodeError> {
        let (status, body) = bytes.split_first().ok_or(ProtocolDecodeError::EmptyReply)?;

        match *status {
            STATUS_PAYLOAD => Ok(RelayReply::Payload(Bytes::copy_from_slice(body))),
            STATUS_NOT_FOUND => Ok(RelayReply::NotFound),
            STATUS_TRANSPORT_FAILURE => Ok(RelayReply::TransportFailure(String::from_utf8(
                body.to_vec(),
            )?)),
            STATUS_REJECTED => {
                let kind = String::from_utf8(body.to_vec())?;
                Ok(RelayReply::Rejected(kind.parse()?))
            }
            other => Err(ProtocolDecodeError::UnknownStatus(other)),
        }
    }
}
