//! # Image Tier Links
//!
//! Tier-based access control and signed, expiring links for stored images.
//!
//! Each account belongs to a subscription tier. A tier decides which
//! representations of an image (the original and derived sizes such as
//! thumbnails) the account may link to, and whether it may mint links that
//! stop working after a bounded lifetime.
//!
//! ## Features
//!
//! - **Data-driven tiers**: tiers are values loaded from JSON, with built-in
//!   Basic / Premium / Enterprise defaults
//! - **Static links**: plain URLs to the representations a tier exposes
//! - **Expiring links**: HMAC-SHA256 signed, stateless tokens bound to one
//!   image, one representation and one expiry instant
//! - **S3 delivery**: representation bytes served from S3 or S3-compatible
//!   storage behind a byte-bounded LRU cache
//!
//! ## Architecture
//!
//! - [`tier`] - Tier policies, representation names and the tier directory
//! - [`image`] - Image records and the image catalog
//! - [`link`] - Link authorization, token issuance and verification
//! - [`storage`] - Object store trait, S3 implementation and cache
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use image_tier_links::{
//!     authorize, Decision, ExpiringLinkIssuer, ExpiringLinkVerifier, ImageRecord,
//!     Representation, SigningKey, TierDirectory,
//! };
//!
//! let directory = TierDirectory::builtin().unwrap();
//! let enterprise = directory.tier("Enterprise").unwrap();
//! let image = ImageRecord::new("img-1", "alice", 0);
//! let original = Representation::original();
//!
//! let decision = authorize(&image, &enterprise, &original, Some(600)).unwrap();
//! assert!(matches!(decision, Decision::Expiring { duration_seconds: 600, .. }));
//!
//! let key = SigningKey::new("a-secret-of-at-least-thirty-two-bytes");
//! let now = 1_700_000_000;
//! let token = ExpiringLinkIssuer::new(key.clone())
//!     .issue("img-1", &original, 600, now)
//!     .encode();
//!
//! let verifier = ExpiringLinkVerifier::new(key);
//! assert!(verifier.verify(&token, "img-1", &original, now + 600).is_ok());
//! assert!(verifier.verify(&token, "img-1", &original, now + 601).is_err());
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod image;
pub mod link;
pub mod server;
pub mod storage;
pub mod tier;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Cli, Command, IssueConfig, IssueOutputFormat, ServeConfig};
pub use error::{AuthorizeError, CatalogError, PolicyError, Rejection, StoreError};
pub use image::{check_content_type, ImageCatalog, ImageRecord, InMemoryImageCatalog};
pub use link::{
    authorize, Decision, ExpiringLinkIssuer, ExpiringLinkToken, ExpiringLinkVerifier, LinkClaims,
    SigningKey, VerifiedLink,
};
pub use server::{
    create_router, AppState, ErrorResponse, HealthResponse, LinkResponse, Principal, RouterConfig,
    ACCOUNT_HEADER,
};
pub use storage::{create_s3_client, CachedStore, ObjectStore, S3ObjectStore, StoredObject};
pub use tier::{ExpiryRange, Representation, TierDirectory, TierPolicy};
