//! Content key resolver service.
//!
//! Serves `GET /content_key?content_key=<identifier>` from a static [`ContentKeyTable`]
//! loaded at startup. The table is shared read-only across requests.
//!
//! [`ContentKeyTable`]: common::content_key::ContentKeyTable

pub mod content_key;

use axum::routing::get;
use axum::Router;

use common::content_key::ContentKeyTable;
use common::crypto::LinkToken;
use service::http::health::{self, AlwaysReady};
use service::STATUS_PREFIX;

/// Everything a resolver request handler needs
#[derive(Debug, Clone)]
pub struct ResolverState {
    pub table: ContentKeyTable,
    /// When set, requests must carry `Authorization: Bearer <token>`
    pub link_token: Option<LinkToken>,
}

impl ResolverState {
    pub fn new(table: ContentKeyTable, link_token: Option<LinkToken>) -> Self {
        Self { table, link_token }
    }
}

pub fn router(state: ResolverState) -> Router {
    Router::new()
        .route("/content_key", get(content_key::handler))
        .nest(
            STATUS_PREFIX,
            health::router(std::sync::Arc::new(AlwaysReady), common::build_info!()),
        )
        .with_state(state)
}
