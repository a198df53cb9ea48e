//! Account tiers.
//!
//! - [`Representation`]: validated name of an image form (`original`, `thumb200`, ...)
//! - [`TierPolicy`]: what a tier exposes and its expiring-link window
//! - [`TierDirectory`]: account id to tier snapshot lookup, loaded once at startup

mod directory;
mod policy;
mod representation;

pub use directory::{
    builtin_tiers, AccountAssignment, TierCatalogFile, TierDirectory, DEFAULT_TIER_NAME,
};
pub use policy::{
    ExpiryRange, TierDefinition, TierPolicy, TierPolicyBuilder, DEFAULT_MAX_EXPIRY_SECONDS,
    DEFAULT_MIN_EXPIRY_SECONDS,
};
pub use representation::{Representation, ORIGINAL};
