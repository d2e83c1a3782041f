//! Outbound fetches to origin and CDN

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use url::Url;

use common::protocol::NO_CACHE_HEADERS;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: Url, status: StatusCode },
}

impl FetchError {
    /// Connection failures and 5xx answers may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            FetchError::Status { status, .. } => status.is_server_error(),
        }
    }
}

/// Plain HTTP GET collaborator
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// [`Fetcher`] backed by `reqwest`, with intermediary caching disabled
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in NO_CACHE_HEADERS {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        response.bytes().await.map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })
    }
}
