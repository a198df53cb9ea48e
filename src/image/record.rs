use std::collections::BTreeSet;

use serde::Serialize;

use crate::tier::Representation;

/// Longest image id accepted from outside the server.
pub const MAX_IMAGE_ID_LEN: usize = 128;

/// Ids end up in URL paths and object keys: ASCII letters, digits, `-`, `_`, `.`.
pub fn is_valid_image_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_IMAGE_ID_LEN
        && !id.starts_with('.')
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Metadata for one uploaded image.
///
/// The core only reads `available`; the derivation pipeline adds derived
/// kinds to it after the upload completes, possibly some time later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// Opaque unique identifier
    pub id: String,

    /// Owning account (lookup only)
    pub owner_id: String,

    /// Representations generated so far; always contains `original`
    pub available: BTreeSet<Representation>,

    /// Upload time, Unix epoch seconds
    pub created_at: u64,
}

impl ImageRecord {
    /// Create a record with only the original available.
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, created_at: u64) -> Self {
        let mut available = BTreeSet::new();
        available.insert(Representation::original());
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            available,
            created_at,
        }
    }

    /// Add a derived representation (builder style).
    pub fn with_representation(mut self, kind: Representation) -> Self {
        self.available.insert(kind);
        self
    }

    pub fn has_representation(&self, kind: &Representation) -> bool {
        self.available.contains(kind)
    }

    pub fn is_owned_by(&self, account_id: &str) -> bool {
        self.owner_id == account_id
    }
}
