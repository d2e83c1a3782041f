use axum::routing::get;
use axum::{Extension, Router};

use common::version::BuildInfo;

pub mod data_source;
mod liveness;
mod readiness;
mod version;

pub use data_source::{AlwaysReady, DataSource, DataSourceError, DynDataSource};

/// Health routes, meant to be nested under [`super::STATUS_PREFIX`]
pub fn router<S>(data_source: DynDataSource, build_info: BuildInfo) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/livez", get(liveness::handler))
        .route("/readyz", get(readiness::handler))
        .route("/version", get(version::handler))
        .layer(Extension(data_source))
        .layer(Extension(build_info))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::data_source::tests::MockReadiness;
    use super::*;

    fn app(readiness: MockReadiness) -> Router {
        Router::new().nest(
            crate::http::STATUS_PREFIX,
            router(Arc::new(readiness), common::build_info!()),
        )
    }

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_status_routes() {
        let ready = app(MockReadiness::Ready);
        assert_eq!(status_of(ready.clone(), "/_status/livez").await, StatusCode::OK);
        assert_eq!(status_of(ready.clone(), "/_status/readyz").await, StatusCode::OK);
        assert_eq!(status_of(ready, "/_status/version").await, StatusCode::OK);

        let failing = app(MockReadiness::DependencyFailure);
        assert_eq!(status_of(failing.clone(), "/_status/livez").await, StatusCode::OK);
        assert_eq!(
            status_of(failing, "/_status/readyz").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
