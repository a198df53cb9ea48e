//! Delivery storage.
//!
//! Representation bytes live in an object store. The link layer never touches
//! storage; handlers fetch from an [`ObjectStore`] only after a link has been
//! authorized or a token verified.
//!
//! - [`S3ObjectStore`]: S3 or any S3-compatible service
//! - [`CachedStore`]: byte-bounded LRU wrapper around another store

mod cache;
mod s3;

pub use cache::{CachedStore, DEFAULT_CACHE_CAPACITY};
pub use s3::{create_s3_client, object_key, S3ObjectStore};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::tier::Representation;

/// A stored representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,

    /// Content type recorded by the store, if any
    pub content_type: Option<String>,
}

impl StoredObject {
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read access to representation bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the bytes of one representation of one image.
    async fn fetch(
        &self,
        image_id: &str,
        representation: &Representation,
    ) -> Result<StoredObject, StoreError>;
}
