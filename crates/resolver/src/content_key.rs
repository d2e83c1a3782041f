use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use common::content_key::AssetIdentifier;

use crate::ResolverState;

#[derive(Debug, Clone, Deserialize)]
pub struct ContentKeyQuery {
    /// Plaintext asset identifier
    pub content_key: String,
}

/// Look up the delivery token provisioned for an identifier
///
/// Answers with the raw token bytes, or 404 if the identifier was never provisioned.
pub async fn handler(
    State(state): State<ResolverState>,
    headers: HeaderMap,
    Query(query): Query<ContentKeyQuery>,
) -> Result<Response, ContentKeyError> {
    if let Some(link_token) = &state.link_token {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| link_token.verify_bearer(v))
            .unwrap_or(false);
        if !authorized {
            tracing::warn!("rejecting content key lookup with bad link token");
            return Err(ContentKeyError::Unauthorized);
        }
    }

    let identifier = AssetIdentifier::new(query.content_key);

    match state.table.lookup(&identifier) {
        Some(token) => {
            tracing::info!(hit = true, "content key lookup");
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/octet-stream")],
                token.into_bytes(),
            )
                .into_response())
        }
        None => {
            tracing::info!(hit = false, "content key lookup");
            Err(ContentKeyError::NotFound)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContentKeyError {
    #[error("content key not found")]
    NotFound,
    #[error("missing or invalid link token")]
    Unauthorized,
}

impl IntoResponse for ContentKeyError {
    fn into_response(self) -> Response {
        let status = match self {
            ContentKeyError::NotFound => StatusCode::NOT_FOUND,
            ContentKeyError::Unauthorized => StatusCode::UNAUTHORIZED,
        };
        let msg = serde_json::json!({"msg": self.to_string()});
        (status, Json(msg)).into_response()
    }
}
