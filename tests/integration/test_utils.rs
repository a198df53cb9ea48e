//! Test utilities for integration tests.
//!
//! Provides an in-memory object store with request tracking and a fully wired
//! router over seeded images and accounts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use image_tier_links::error::StoreError;
use image_tier_links::image::{ImageRecord, InMemoryImageCatalog};
use image_tier_links::link::SigningKey;
use image_tier_links::server::{create_router, AppState, RouterConfig, ACCOUNT_HEADER};
use image_tier_links::storage::{ObjectStore, StoredObject};
use image_tier_links::tier::{Representation, TierDirectory};
use image_tier_links::FixedClock;

pub const SECRET: &str = "integration-secret-key-0123456789";

/// Fixed "now" for every test.
pub const T0: u64 = 1_700_000_000;

// =============================================================================
// Mock Object Store
// =============================================================================

/// In-memory object store that counts fetches.
#[derive(Default)]
pub struct MockObjectStore {
    objects: HashMap<(String, Representation), StoredObject>,
    fetch_count: AtomicUsize,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, image_id: &str, kind: &str, data: &'static [u8]) -> Self {
        self.objects.insert(
            (image_id.to_string(), rep(kind)),
            StoredObject::new(Bytes::from_static(data), Some("image/jpeg".to_string())),
        );
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn fetch(
        &self,
        image_id: &str,
        representation: &Representation,
    ) -> Result<StoredObject, StoreError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(&(image_id.to_string(), representation.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", image_id, representation)))
    }
}

// =============================================================================
// Test Application
// =============================================================================

pub const ORIGINAL_BYTES: &[u8] = b"\xFF\xD8original-bytes";
pub const THUMB200_BYTES: &[u8] = b"\xFF\xD8thumb200-bytes";
pub const THUMB400_BYTES: &[u8] = b"\xFF\xD8thumb400-bytes";

/// A router with three accounts, one per built-in tier:
///
/// - `alice` (Basic) owns `basic-img`
/// - `paula` (Premium) owns `premium-img`
/// - `erin` (Enterprise) owns `ent-img` and `ent-fresh` (no derived sizes yet)
///
/// All images have `original`, `thumb200` and `thumb400` generated except
/// `ent-fresh`, which only has its original.
pub struct TestApp {
    pub router: Router,
    pub clock: FixedClock,
    pub catalog: Arc<InMemoryImageCatalog>,
    pub store: Arc<MockObjectStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(|state| state)
    }

    /// Build with a tweak applied to the state before routing.
    pub fn with(configure: impl FnOnce(AppState) -> AppState) -> Self {
        let directory = TierDirectory::builtin()
            .and_then(|d| d.with_account("alice", "Basic"))
            .and_then(|d| d.with_account("paula", "Premium"))
            .and_then(|d| d.with_account("erin", "Enterprise"))
            .unwrap();

        let catalog = Arc::new(
            InMemoryImageCatalog::new()
                .with_record(full_record("basic-img", "alice", T0 - 300))
                .with_record(full_record("premium-img", "paula", T0 - 200))
                .with_record(full_record("ent-img", "erin", T0 - 100))
                .with_record(ImageRecord::new("ent-fresh", "erin", T0)),
        );

        let mut store = MockObjectStore::new();
        for id in ["basic-img", "premium-img", "ent-img", "ent-fresh"] {
            store = store
                .with_object(id, "original", ORIGINAL_BYTES)
                .with_object(id, "thumb200", THUMB200_BYTES)
                .with_object(id, "thumb400", THUMB400_BYTES);
        }
        let store = Arc::new(store);

        let clock = FixedClock::new(T0);
        let state = AppState::new(
            directory,
            catalog.clone(),
            store.clone(),
            SigningKey::new(SECRET),
        )
        .with_clock(Arc::new(clock.clone()));

        let router = create_router(configure(state), RouterConfig::new().with_tracing(false));

        Self {
            router,
            clock,
            catalog,
            store,
        }
    }

    pub async fn get(&self, uri: &str, account: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, account, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        account: Option<&str>,
        json_body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(account) = account {
            builder = builder.header(ACCOUNT_HEADER, account);
        }

        let body = match json_body {
            Some(value) => {
                builder = builder.header(http::header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Request a link and return the JSON response, asserting 200.
    pub async fn link(&self, account: &str, image_id: &str, query: &str) -> serde_json::Value {
        let response = self
            .get(&format!("/images/{}/link?{}", image_id, query), Some(account))
            .await;
        assert_eq!(response.status, StatusCode::OK, "body: {:?}", response.body);
        response.json()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The `error` field of a JSON error body.
    pub fn error_type(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn rep(kind: &str) -> Representation {
    Representation::new(kind).unwrap()
}

fn full_record(id: &str, owner: &str, created_at: u64) -> ImageRecord {
    ImageRecord::new(id, owner, created_at)
        .with_representation(rep("thumb200"))
        .with_representation(rep("thumb400"))
}

/// Drop any scheme and host from an emitted URL, keeping path and query.
pub fn fetch_path(url: &str) -> &str {
    url.find("/images/").map(|i| &url[i..]).unwrap_or(url)
}
