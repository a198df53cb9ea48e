use thiserror::Error;

use crate::tier::Representation;

/// Reasons the authorizer refuses to hand out a link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizeError {
    /// The representation has not been generated for this image (yet), or the
    /// requested name is not a representation at all
    #[error("Representation '{representation}' is not available for this image")]
    RepresentationUnavailable { representation: String },

    /// The caller's tier does not expose this representation
    #[error("Tier '{tier}' does not expose representation '{representation}'")]
    TierForbidden {
        tier: String,
        representation: Representation,
    },

    /// An expiring link was requested but the tier has none
    #[error("Tier '{tier}' does not allow expiring links")]
    ExpiringLinksNotAllowed { tier: String },

    /// The requested lifetime falls outside the tier's window
    #[error("Expiry of {requested}s is outside the allowed range {min}-{max}s")]
    ExpiryOutOfRange { requested: u64, min: u64, max: u64 },
}

/// Reasons a presented expiring-link token is rejected.
///
/// Variants are ordered the way the verifier checks them: the first failing
/// gate determines the reported reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Token could not be split, decoded or parsed
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Signature does not match the decoded contents
    #[error("Invalid token signature")]
    BadSignature,

    /// Token is past its expiry
    #[error("Link expired at {expired_at} (current time: {current_time})")]
    Expired { expired_at: u64, current_time: u64 },

    /// Token was minted for a different image
    #[error("Token was not issued for this image")]
    ImageMismatch,

    /// Token was minted for a different representation
    #[error("Token was not issued for this representation")]
    RepresentationMismatch,
}

/// Invalid tier definitions or tier catalog contents, detected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Tier '{0}' must expose at least one representation")]
    EmptyExposableSizes(String),

    #[error("Tier '{tier}' has an invalid expiry range {min}-{max}s (need 1 <= min <= max)")]
    InvalidExpiryRange { tier: String, min: u64, max: u64 },

    #[error("Tier name must not be empty")]
    EmptyTierName,

    #[error("Duplicate tier name: {0}")]
    DuplicateTier(String),

    #[error("Unknown tier '{tier}' referenced by {referenced_by}")]
    UnknownTier { tier: String, referenced_by: String },

    #[error("Invalid representation name '{0}' (use lowercase letters, digits, '-' or '_')")]
    InvalidRepresentation(String),

    #[error("Failed to read tier catalog: {0}")]
    Read(String),

    #[error("Failed to parse tier catalog: {0}")]
    Parse(String),
}

/// Errors from the storage/delivery collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors from the image catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Image already registered: {0}")]
    AlreadyExists(String),

    #[error("Unsupported content type '{0}' (use image/jpeg or image/png)")]
    UnsupportedContentType(String),
}
