use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use common::version::BuildInfo;

#[tracing::instrument]
pub async fn handler(Extension(build_info): Extension<BuildInfo>) -> Response {
    (StatusCode::OK, Json(build_info)).into_response()
}
