//! Client for the content key resolver's `GET /content_key` ingress

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use url::Url;

use common::content_key::{AssetIdentifier, ContentKeySource, DeliveryToken, ResolverError};
use common::crypto::LinkToken;
use service::http::health::{DataSource, DataSourceError};

const CONTENT_KEY_PATH: &str = "content_key";
const LIVEZ_PATH: &str = "_status/livez";

#[derive(Debug, Clone)]
pub struct HttpResolverClient {
    remote: Url,
    client: Client,
    link_token: Option<LinkToken>,
}

impl HttpResolverClient {
    pub fn new(
        remote: &Url,
        link_token: Option<LinkToken>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        // endpoints are joined relative to the base path
        let mut remote = remote.clone();
        if !remote.path().ends_with('/') {
            let path = format!("{}/", remote.path());
            remote.set_path(&path);
        }
        Ok(Self {
            remote,
            client,
            link_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    fn endpoint(&self, path: &str) -> Result<Url, ResolverError> {
        self.remote
            .join(path)
            .map_err(|e| ResolverError::Unavailable(format!("invalid resolver url: {}", e)))
    }
}

#[async_trait]
impl ContentKeySource for HttpResolverClient {
    async fn resolve(
        &self,
        identifier: &AssetIdentifier,
    ) -> Result<Option<DeliveryToken>, ResolverError> {
        let mut url = self.endpoint(CONTENT_KEY_PATH)?;
        url.query_pairs_mut()
            .append_pair("content_key", identifier.as_str());

        let mut request = self.client.get(url);
        if let Some(link_token) = &self.link_token {
            request = request.header(header::AUTHORIZATION, link_token.bearer());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolverError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let token = response
                    .bytes()
                    .await
                    .map_err(|e| ResolverError::Unavailable(e.to_string()))?;
                Ok(Some(DeliveryToken::from(token)))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(ResolverError::Unavailable(format!(
                "resolver answered HTTP {}",
                status
            ))),
        }
    }
}

/// The relay is ready when its resolver is alive
#[async_trait]
impl DataSource for HttpResolverClient {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        let url = self
            .endpoint(LIVEZ_PATH)
            .map_err(|_| DataSourceError::DependencyFailure)?;
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            _ => Err(DataSourceError::DependencyFailure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(remote: &str) -> HttpResolverClient {
        let remote = Url::parse(remote).unwrap();
        HttpResolverClient::new(&remote, None, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let resolver = client("http://resolver.internal/resolver/");
        assert_eq!(
            resolver.endpoint(CONTENT_KEY_PATH).unwrap().as_str(),
            "http://resolver.internal/resolver/content_key"
        );
        assert_eq!(
            resolver.endpoint(LIVEZ_PATH).unwrap().as_str(),
            "http://resolver.internal/resolver/_status/livez"
        );

        let resolver = client("http://resolver.internal/resolver");
        assert_eq!(
            resolver.endpoint(CONTENT_KEY_PATH).unwrap().as_str(),
            "http://resolver.internal/resolver/content_key"
        );

        let resolver = client("http://resolver.internal:8000");
        assert_eq!(
            resolver.endpoint(CONTENT_KEY_PATH).unwrap().as_str(),
            "http://resolver.internal:8000/content_key"
        );
    }
}
