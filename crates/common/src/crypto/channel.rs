//! Authenticated encryption using ChaCha20-Poly1305
//!
//! A [`CipherChannel`] seals plaintext into a [`SealedToken`] with layout
//! `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`. A fresh random nonce is drawn for
//! every seal, so sealing the same plaintext twice yields different tokens. Opening fails
//! closed: a wrong key, a truncated token or a single flipped bit all produce a
//! [`DecryptionError`] and no plaintext.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chacha20poly1305::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::key::{KeyDomain, SymmetricKey};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur while sealing
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("failed to generate nonce: {0}")]
    Nonce(getrandom::Error),
    #[error("encrypt error under {0} key")]
    Encrypt(KeyDomain),
}

/// A token failed to authenticate. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecryptionError {
    #[error("token is not valid url-safe base64")]
    Encoding,
    #[error("token too short: {0} bytes")]
    Truncated(usize),
    #[error("token failed to authenticate under {0} key")]
    Authentication(KeyDomain),
}

/// Authenticated ciphertext produced by a [`CipherChannel`]
#[derive(Clone, PartialEq, Eq)]
pub struct SealedToken(Vec<u8>);

impl fmt::Debug for SealedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedToken({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for SealedToken {
    fn from(bytes: Vec<u8>) -> Self {
        SealedToken(bytes)
    }
}

impl SealedToken {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode for transport in a query string or response body
    pub fn to_urlsafe(&self) -> String {
        URL_SAFE.encode(&self.0)
    }

    /// Decode a url-safe token. A token that cannot be decoded cannot be authenticated either,
    /// so this fails with a [`DecryptionError`].
    pub fn from_urlsafe(encoded: &str) -> Result<Self, DecryptionError> {
        URL_SAFE
            .decode(encoded.trim())
            .map(SealedToken)
            .map_err(|_| DecryptionError::Encoding)
    }
}

impl Serialize for SealedToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_urlsafe())
    }
}

impl<'de> Deserialize<'de> for SealedToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        SealedToken::from_urlsafe(&encoded).map_err(serde::de::Error::custom)
    }
}

/// A symmetric encryption boundary scoped to a single key
///
/// The channel has no state besides its key and the domain it was provisioned for.
///
/// # Examples
///
/// ```ignore
/// let channel = CipherChannel::new(KeyDomain::Tunnel, SymmetricKey::generate()?);
///
/// let token = channel.seal(b"direct")?;
/// let recovered = channel.open(&token)?;
/// assert_eq!(b"direct", &recovered[..]);
/// ```
#[derive(Clone)]
pub struct CipherChannel {
    domain: KeyDomain,
    key: SymmetricKey,
}

impl fmt::Debug for CipherChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherChannel")
            .field("domain", &self.domain)
            .finish()
    }
}

impl CipherChannel {
    pub fn new(domain: KeyDomain, key: SymmetricKey) -> Self {
        Self { domain, key }
    }

    pub fn domain(&self) -> KeyDomain {
        self.domain
    }

    /// Encrypt `plaintext` under a fresh random nonce
    ///
    /// # Errors
    ///
    /// Returns an error only if the system RNG fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedToken, CipherError> {
        let key = Key::from_slice(self.key.bytes());
        let cipher = ChaCha20Poly1305::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes).map_err(CipherError::Nonce)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CipherError::Encrypt(self.domain))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(SealedToken(out))
    }

    /// Decrypt and authenticate a token sealed by a channel holding the same key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token is too short to contain a nonce and tag
    /// - Authentication tag verification fails (tampered token or wrong key)
    pub fn open(&self, token: &SealedToken) -> Result<Vec<u8>, DecryptionError> {
        let data = token.as_bytes();
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(DecryptionError::Truncated(data.len()));
        }

        let key = Key::from_slice(self.key.bytes());
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(key);
        cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| DecryptionError::Authentication(self.domain))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn channel(domain: KeyDomain) -> CipherChannel {
        CipherChannel::new(domain, SymmetricKey::generate().unwrap())
    }

    #[test]
    fn test_seal_open() {
        let channel = channel(KeyDomain::Tunnel);
        let data = b"hello world, this is a test message for the tunnel";

        let token = channel.seal(data).unwrap();
        let opened = channel.open(&token).unwrap();

        assert_eq!(data.as_slice(), opened.as_slice());
        assert_eq!(token.len(), NONCE_SIZE + data.len() + TAG_SIZE);
    }

    #[test]
    fn test_seal_is_not_deterministic() {
        let channel = channel(KeyDomain::Tunnel);
        let data = b"same plaintext";

        let first = channel.seal(data).unwrap();
        let second = channel.seal(data).unwrap();

        assert_ne!(first, second);
        assert_ne!(first.as_bytes()[..NONCE_SIZE], second.as_bytes()[..NONCE_SIZE]);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealer = channel(KeyDomain::Tunnel);
        let opener = channel(KeyDomain::Tunnel);

        let token = sealer.seal(b"secret").unwrap();
        assert_eq!(
            opener.open(&token),
            Err(DecryptionError::Authentication(KeyDomain::Tunnel))
        );
    }

    #[test]
    fn test_every_flipped_byte_is_detected() {
        let channel = channel(KeyDomain::Asset);
        let token = channel.seal(b"asset payload").unwrap();

        for i in 0..token.len() {
            let mut corrupted = token.clone().into_bytes();
            corrupted[i] ^= 0x01;
            let result = channel.open(&SealedToken::from(corrupted));
            assert_eq!(result, Err(DecryptionError::Authentication(KeyDomain::Asset)));
        }
    }

    #[test]
    fn test_truncated_token() {
        let channel = channel(KeyDomain::Tunnel);
        let token = channel.seal(b"").unwrap();
        assert_eq!(token.len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(channel.open(&token).unwrap(), Vec::<u8>::new());

        let mut bytes = token.into_bytes();
        bytes.pop();
        assert_eq!(
            channel.open(&SealedToken::from(bytes)),
            Err(DecryptionError::Truncated(NONCE_SIZE + TAG_SIZE - 1))
        );
    }

    #[test]
    fn test_urlsafe_encoding() {
        let channel = channel(KeyDomain::ContentIdentifier);
        let token = channel.seal(b"10mb.bin").unwrap();

        let encoded = token.to_urlsafe();
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));

        let decoded = SealedToken::from_urlsafe(&encoded).unwrap();
        assert_eq!(channel.open(&decoded).unwrap(), b"10mb.bin".to_vec());

        assert_eq!(
            SealedToken::from_urlsafe("%%%"),
            Err(DecryptionError::Encoding)
        );
    }

    #[test]
    fn test_debug_hides_contents() {
        let token = SealedToken::from(vec![1, 2, 3]);
        assert_eq!(format!("{:?}", token), "SealedToken(3 bytes)");
    }
}
