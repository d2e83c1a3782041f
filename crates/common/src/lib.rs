/**
 * Symmetric cipher channels.
 *  - Fixed keys, one per trust domain
 *  - Authenticated seal/open with fresh nonces
 */
pub mod crypto;
/**
 * Content Key Resolver table: maps opaque
 *  asset identifiers to delivery tokens.
 */
pub mod content_key;
/**
 * Wire formats exchanged between client,
 *  relay and resolver.
 */
pub mod protocol;
/**
 * Helper for reporting build version information.
 */
pub mod version;

pub mod prelude {
    pub use crate::content_key::{
        AssetIdentifier, ContentKeySource, ContentKeyTable, DeliveryToken, ResolverError,
    };
    pub use crate::crypto::{
        ChannelSet, CipherChannel, CipherError, DecryptionError, KeyDomain, LinkToken,
        SealedToken, SymmetricKey,
    };
    pub use crate::protocol::{
        ProtocolDecodeError, RejectKind, RelayReply, RoutingInstruction, NO_CACHE_HEADERS,
    };
    pub use crate::version::BuildInfo;
}
