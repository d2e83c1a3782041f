use std::fmt;
use std::ops::Deref;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Size of a ChaCha20-Poly1305 key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Errors that can occur while building key material
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key size, expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("key is not valid url-safe base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("failed to generate random bytes: {0}")]
    Rng(getrandom::Error),
    #[error("generated keys collided")]
    Collision,
}

/// Errors raised when a set of keys violates domain isolation
#[derive(Debug, thiserror::Error)]
pub enum KeyConfigError {
    #[error("{0} and {1} domains share the same key")]
    SharedKey(KeyDomain, KeyDomain),
    #[error("invalid {0} key: {1}")]
    Invalid(KeyDomain, KeyError),
}

/// The trust domain a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDomain {
    Tunnel,
    ContentIdentifier,
    Asset,
}

impl fmt::Display for KeyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyDomain::Tunnel => "tunnel",
            KeyDomain::ContentIdentifier => "content-identifier",
            KeyDomain::Asset => "asset",
        };
        write!(f, "{}", name)
    }
}

/// A fixed 256-bit secret scoping one cipher channel
///
/// Keys travel as url-safe base64 (the same alphabet used for sealed tokens) so they can be
/// provisioned through environment variables. The key bytes never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl Deref for SymmetricKey {
    type Target = [u8; KEY_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; KEY_SIZE]> for SymmetricKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        SymmetricKey(bytes)
    }
}

impl SymmetricKey {
    /// Generate a new random key using the system CSPRNG
    pub fn generate() -> Result<Self, KeyError> {
        let mut buff = [0; KEY_SIZE];
        getrandom::getrandom(&mut buff).map_err(KeyError::Rng)?;
        Ok(Self(buff))
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, KeyError> {
        if data.len() != KEY_SIZE {
            return Err(KeyError::InvalidLength {
                expected: KEY_SIZE,
                actual: data.len(),
            });
        }
        let mut buff = [0; KEY_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Parse a url-safe base64 encoded key
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = URL_SAFE.decode(encoded.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// Check that no two domains in `keys` are backed by the same key bytes
pub fn ensure_distinct(keys: &[(KeyDomain, &SymmetricKey)]) -> Result<(), KeyConfigError> {
    for (i, (domain, key)) in keys.iter().enumerate() {
        for (other_domain, other_key) in &keys[i + 1..] {
            if key == other_key {
                return Err(KeyConfigError::SharedKey(*domain, *other_domain));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_size_validation() {
        let too_short = [1u8; 16];
        let too_long = [1u8; 64];

        assert!(SymmetricKey::from_slice(&too_short).is_err());
        assert!(SymmetricKey::from_slice(&too_long).is_err());

        let just_right = [1u8; KEY_SIZE];
        assert!(SymmetricKey::from_slice(&just_right).is_ok());
    }

    #[test]
    fn test_base64_key_parsing() {
        let key = SymmetricKey::generate().unwrap();
        let encoded = key.to_base64();

        let parsed = SymmetricKey::from_base64(&encoded).unwrap();
        assert_eq!(parsed, key);

        // surrounding whitespace from env files is tolerated
        let parsed = SymmetricKey::from_base64(&format!(" {}\n", encoded)).unwrap();
        assert_eq!(parsed, key);

        assert!(matches!(
            SymmetricKey::from_base64("not base64!"),
            Err(KeyError::Encoding(_))
        ));
        assert!(matches!(
            SymmetricKey::from_base64(&URL_SAFE.encode([7u8; 16])),
            Err(KeyError::InvalidLength { actual: 16, .. })
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = SymmetricKey::from([0xAB; KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert_eq!(debug, "SymmetricKey(..)");
    }

    #[test]
    fn test_ensure_distinct() {
        let a = SymmetricKey::from([1u8; KEY_SIZE]);
        let b = SymmetricKey::from([2u8; KEY_SIZE]);

        assert!(ensure_distinct(&[(KeyDomain::Tunnel, &a), (KeyDomain::Asset, &b)]).is_ok());
        assert!(matches!(
            ensure_distinct(&[
                (KeyDomain::Tunnel, &a),
                (KeyDomain::ContentIdentifier, &b),
                (KeyDomain::Asset, &a),
            ]),
            Err(KeyConfigError::SharedKey(KeyDomain::Tunnel, KeyDomain::Asset))
        ));
    }
}
