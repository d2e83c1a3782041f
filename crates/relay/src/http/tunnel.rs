use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::{sealed_response, RelayHttpError, RelayState};

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelQuery {
    /// Url-safe routing instruction sealed under the tunnel key
    pub payload: String,
}

pub async fn handler(
    State(state): State<RelayState>,
    Query(query): Query<TunnelQuery>,
) -> Result<Response, RelayHttpError> {
    let sealed = state.dispatcher.handle_tunnel(&query.payload).await?;
    Ok(sealed_response(sealed))
}
