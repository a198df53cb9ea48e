//! Image metadata catalog.
//!
//! The [`ImageCatalog`] trait is the seam to whatever persists image records.
//! [`InMemoryImageCatalog`] backs the server when no external store is wired in
//! and is what the tests use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CatalogError;
use crate::tier::Representation;

use super::ImageRecord;

/// Content types accepted on upload registration.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Check an upload's declared content type.
pub fn check_content_type(content_type: &str) -> Result<(), CatalogError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(CatalogError::UnsupportedContentType(content_type.to_string()))
    }
}

/// Storage of image records.
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    /// Store a new record. Fails if the id is taken.
    async fn register(&self, record: ImageRecord) -> Result<(), CatalogError>;

    /// Fetch a record by id.
    async fn get(&self, image_id: &str) -> Result<ImageRecord, CatalogError>;

    /// All records owned by an account, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Vec<ImageRecord>;

    /// Record that a derived representation has been generated.
    ///
    /// Returns the updated record. Marking an already available kind is a no-op.
    async fn mark_available(
        &self,
        image_id: &str,
        kind: Representation,
    ) -> Result<ImageRecord, CatalogError>;
}

/// Process-local image catalog.
#[derive(Default)]
pub struct InMemoryImageCatalog {
    records: RwLock<HashMap<String, ImageRecord>>,
}

impl InMemoryImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog (builder style, for startup fixtures and tests).
    pub fn with_record(mut self, record: ImageRecord) -> Self {
        self.records.get_mut().insert(record.id.clone(), record);
        self
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ImageCatalog for InMemoryImageCatalog {
    async fn register(&self, record: ImageRecord) -> Result<(), CatalogError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(CatalogError::AlreadyExists(record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, image_id: &str) -> Result<ImageRecord, CatalogError> {
        self.records
            .read()
            .await
            .get(image_id)
            .cloned()
            .ok_or_else(|| CatalogError::ImageNotFound(image_id.to_string()))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Vec<ImageRecord> {
        let mut owned: Vec<ImageRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.is_owned_by(owner_id))
            .cloned()
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        owned
    }

    async fn mark_available(
        &self,
        image_id: &str,
        kind: Representation,
    ) -> Result<ImageRecord, CatalogError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(image_id)
            .ok_or_else(|| CatalogError::ImageNotFound(image_id.to_string()))?;
        record.available.insert(kind);
        Ok(record.clone())
    }
}
