//! Cipher channels for the ndnx relay protocol
//!
//! Every hop of the protocol is protected by a [`CipherChannel`]: a ChaCha20-Poly1305
//! boundary scoped to exactly one [`SymmetricKey`]. Keys are provisioned out-of-band and
//! belong to one of three trust domains ([`KeyDomain`]):
//!
//! - **Tunnel**: client <-> relay traffic
//! - **Content identifier**: the asset name carried inside a resolve instruction
//! - **Asset**: the asset bytes stored on the CDN
//!
//! Compromise of one domain's key must not expose the other two, so no two domains may
//! ever share key material. [`ChannelSet`] enforces this for parties that hold all three.

mod channel;
mod key;
mod link;

pub use channel::{CipherChannel, CipherError, DecryptionError, SealedToken, NONCE_SIZE, TAG_SIZE};
pub use key::{ensure_distinct, KeyConfigError, KeyDomain, KeyError, SymmetricKey, KEY_SIZE};
pub use link::LinkToken;

/// All three channels, as held by the client
#[derive(Debug, Clone)]
pub struct ChannelSet {
    pub tunnel: CipherChannel,
    pub content_identifier: CipherChannel,
    pub asset: CipherChannel,
}

impl ChannelSet {
    /// Build the channel set, refusing keys that collapse two domains onto one
    pub fn new(
        tunnel: SymmetricKey,
        content_identifier: SymmetricKey,
        asset: SymmetricKey,
    ) -> Result<Self, KeyConfigError> {
        ensure_distinct(&[
            (KeyDomain::Tunnel, &tunnel),
            (KeyDomain::ContentIdentifier, &content_identifier),
            (KeyDomain::Asset, &asset),
        ])?;

        Ok(Self {
            tunnel: CipherChannel::new(KeyDomain::Tunnel, tunnel),
            content_identifier: CipherChannel::new(KeyDomain::ContentIdentifier, content_identifier),
            asset: CipherChannel::new(KeyDomain::Asset, asset),
        })
    }

    /// Generate a set of fresh random keys
    pub fn generate() -> Result<Self, KeyError> {
        let set = Self::new(
            SymmetricKey::generate()?,
            SymmetricKey::generate()?,
            SymmetricKey::generate()?,
        )
        .map_err(|_| KeyError::Collision)?;
        Ok(set)
    }
}
