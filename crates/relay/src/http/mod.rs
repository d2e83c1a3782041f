use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use common::crypto::{CipherError, SealedToken};
use service::http::health::{self, DynDataSource};
use service::STATUS_PREFIX;

use crate::Dispatcher;

pub mod resolve;
pub mod tunnel;

const RELAY_PREFIX: &str = "/relay";

#[derive(Debug, Clone)]
pub struct RelayState {
    pub dispatcher: Dispatcher,
}

pub fn router(state: RelayState, readiness: DynDataSource) -> Router {
    let relay_routes = Router::new()
        .route("/tunnel", get(tunnel::handler))
        .route("/resolve", get(resolve::handler));

    Router::new()
        .nest(RELAY_PREFIX, relay_routes)
        .nest(
            STATUS_PREFIX,
            health::router(readiness, common::build_info!()),
        )
        .with_state(state)
}

/// Body of every successful relay response: the url-safe tunnel-sealed reply
fn sealed_response(sealed: SealedToken) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        sealed.to_urlsafe(),
    )
        .into_response()
}

/// Transport-level failures, the only responses that leave the relay unsealed
#[derive(Debug, thiserror::Error)]
pub enum RelayHttpError {
    #[error("failed to seal relay reply: {0}")]
    Seal(#[from] CipherError),
}

impl IntoResponse for RelayHttpError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "relay request failed");
        let msg = serde_json::json!({"error": "relay failed to seal its reply"});
        (StatusCode::INTERNAL_SERVER_ERROR, Json(msg)).into_response()
    }
}
