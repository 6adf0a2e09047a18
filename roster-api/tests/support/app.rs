//! In-process application harness: the real router over a counting store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use roster_api::{create_api_router, AppState, RefreshConfig, Refresher};
use roster_storage::{EntityCache, EntityStore};
use roster_test_utils::CountingStore;
use tower::ServiceExt;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Status and decoded JSON body of a response; `Null` when the body is empty.
pub type Reply = (StatusCode, serde_json::Value);

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub cache: Arc<EntityCache>,
    /// Not spawned; tests drive ticks by hand or move it out and spawn it.
    pub refresher: Refresher,
}

impl TestApp {
    pub fn new(store: CountingStore) -> Self {
        Self::with_refresh_config(store, RefreshConfig::default())
    }

    pub fn with_refresh_config(store: CountingStore, config: RefreshConfig) -> Self {
        let store = Arc::new(store);
        let gateway: Arc<dyn EntityStore> = store.clone();
        let cache = Arc::new(EntityCache::new());
        let refresher = Refresher::new(Arc::clone(&gateway), Arc::clone(&cache), config);
        let state = AppState::new(gateway, Arc::clone(&cache), refresher.status());

        Self {
            router: create_api_router(state),
            store,
            cache,
            refresher,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResult<Reply> {
        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str) -> TestResult<Reply> {
        get(&self.router, uri).await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> TestResult<Reply> {
        send(&self.router, json_request(Method::POST, uri, body)?).await
    }

    pub async fn put_json(&self, uri: &str, body: &str) -> TestResult<Reply> {
        send(&self.router, json_request(Method::PUT, uri, body)?).await
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResult<Reply> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

pub async fn get(router: &Router, uri: &str) -> TestResult<Reply> {
    send(router, Request::builder().uri(uri).body(Body::empty())?).await
}

pub fn json_request(method: Method, uri: &str, body: &str) -> TestResult<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}
