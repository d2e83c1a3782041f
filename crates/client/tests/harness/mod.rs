//! Shared fixtures for end-to-end tests: a stub origin/CDN, a real resolver and a real
//! relay, each on an ephemeral loopback port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tokio::net::TcpListener;
use url::Url;

use client::config::BenchSettings;
use client::Orchestrator;
use common::content_key::ContentKeyTable;
use common::crypto::{CipherChannel, KeyDomain, SymmetricKey};
use relay::fetch::HttpFetcher;
use relay::resolver_client::HttpResolverClient;
use relay::{DispatchPolicy, Dispatcher, RelayKeys, RelayState, RelayTargets};
use resolver::ResolverState;

pub const ORIGIN_BODY: &[u8] = b"bytes served by the origin";
pub const CDN_BODY: &[u8] = b"bytes served by the cdn edge";
pub const ASSET_PLAINTEXT: &[u8] = b"named-data asset plaintext";
pub const DELIVERY_TOKEN: &str = "token-abc";

#[derive(Clone)]
struct StubState {
    hits: Arc<AtomicUsize>,
    sealed_asset: Bytes,
}

async fn origin(State(state): State<StubState>) -> Bytes {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Bytes::from_static(ORIGIN_BODY)
}

async fn cdn(State(state): State<StubState>) -> Bytes {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Bytes::from_static(CDN_BODY)
}

async fn asset_object(State(state): State<StubState>, Path(token): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if token == DELIVERY_TOKEN {
        state.sealed_asset.clone().into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn url(addr: SocketAddr, path: &str) -> Url {
    Url::parse(&format!("http://{}{}", addr, path)).unwrap()
}

/// A running deployment plus the keys a client needs to talk to it
pub struct Stack {
    pub relay_url: Url,
    pub stub_addr: SocketAddr,
    /// Requests that reached the stub origin/CDN
    pub stub_hits: Arc<AtomicUsize>,
    pub tunnel: SymmetricKey,
    pub content_identifier: SymmetricKey,
    pub asset: SymmetricKey,
}

impl Stack {
    pub async fn start() -> Self {
        let tunnel = SymmetricKey::generate().unwrap();
        let content_identifier = SymmetricKey::generate().unwrap();
        let asset = SymmetricKey::generate().unwrap();

        let sealed_asset = CipherChannel::new(KeyDomain::Asset, asset.clone())
            .seal(ASSET_PLAINTEXT)
            .unwrap();
        let stub_hits = Arc::new(AtomicUsize::new(0));
        let stub = Router::new()
            .route("/origin/10mb.bin", get(origin))
            .route("/cdn/10mb.bin", get(cdn))
            .route("/assets/:token", get(asset_object))
            .with_state(StubState {
                hits: stub_hits.clone(),
                sealed_asset: Bytes::from(sealed_asset.into_bytes()),
            });
        let stub_addr = spawn(stub).await;

        let table = ContentKeyTable::new().with_entry("10mb.bin", DELIVERY_TOKEN);
        let resolver_addr = spawn(resolver::router(ResolverState::new(table, None))).await;

        let resolver_client = Arc::new(
            HttpResolverClient::new(&url(resolver_addr, "/"), None, Duration::from_secs(5))
                .unwrap(),
        );
        let dispatcher = Dispatcher::new(
            RelayKeys::new(tunnel.clone(), content_identifier.clone()).unwrap(),
            RelayTargets {
                origin_url: url(stub_addr, "/origin/10mb.bin"),
                cdn_url: url(stub_addr, "/cdn/10mb.bin"),
            },
            Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap()),
            resolver_client.clone(),
            DispatchPolicy::default(),
        );
        let relay_addr = spawn(relay::router(RelayState { dispatcher }, resolver_client)).await;

        Self {
            relay_url: url(relay_addr, "/"),
            stub_addr,
            stub_hits,
            tunnel,
            content_identifier,
            asset,
        }
    }

    /// Client settings pointing at this deployment
    pub fn settings(&self) -> BenchSettings {
        BenchSettings {
            relay_url: Some(self.relay_url.clone()),
            origin_url: Some(url(self.stub_addr, "/origin/10mb.bin")),
            cdn_url: Some(url(self.stub_addr, "/cdn/10mb.bin")),
            cdn_base_url: Some(url(self.stub_addr, "/assets/")),
            asset: None,
            tunnel_key: Some(self.tunnel.to_base64()),
            content_key: Some(self.content_identifier.to_base64()),
            asset_key: Some(self.asset.to_base64()),
            request_timeout_ms: Some(5_000),
        }
    }

    pub fn orchestrator(&self, settings: BenchSettings) -> Orchestrator {
        let config = settings.resolve().unwrap();
        Orchestrator::new(
            config.endpoints,
            config.channels,
            config.asset,
            config.request_timeout,
        )
        .unwrap()
    }

    pub fn stub_hits(&self) -> usize {
        self.stub_hits.load(Ordering::SeqCst)
    }
}
