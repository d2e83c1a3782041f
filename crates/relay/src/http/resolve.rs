use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::{sealed_response, RelayHttpError, RelayState};

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveQuery {
    /// Url-safe asset identifier sealed under the content-identifier key
    pub content_key: String,
}

pub async fn handler(
    State(state): State<RelayState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Response, RelayHttpError> {
    let sealed = state.dispatcher.handle_resolve(&query.content_key).await?;
    Ok(sealed_response(sealed))
}
