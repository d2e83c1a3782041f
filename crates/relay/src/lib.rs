//! ndnx relay node
//!
//! The relay terminates the client's tunnel channel. Each inbound request is handled on its
//! own with no state carried between requests:
//!
//! 1. open the payload under the tunnel key
//! 2. decode the [`RoutingInstruction`]
//! 3. fetch from origin/CDN, or open the embedded content key under the content-identifier
//!    key and ask the resolver
//! 4. seal the outcome under the tunnel key
//!
//! Every payload-level failure (bad token, unknown route, resolver miss, fetch failure) is
//! answered with a tunnel-sealed [`RelayReply`]. The relay never holds the asset key.
//!
//! [`RoutingInstruction`]: common::protocol::RoutingInstruction
//! [`RelayReply`]: common::protocol::RelayReply

pub mod config;
pub mod dispatcher;
pub mod fetch;
pub mod http;
pub mod resolver_client;

pub use config::{Config, DispatchPolicy, RelayKeys, RelayTargets};
pub use dispatcher::{DispatchError, Dispatcher};
pub use http::{router, RelayState};
