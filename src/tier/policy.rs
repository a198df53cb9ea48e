//! Tier capability policies.
//!
//! A [`TierPolicy`] is pure data: which representations a tier exposes and
//! whether (and for how long) it may mint expiring links. Every tier, built-in
//! or admin-defined, is an instance of the same shape; nothing downstream
//! branches on a tier's name.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

use super::Representation;

/// Shortest expiring-link lifetime offered by the built-in tiers (5 minutes).
pub const DEFAULT_MIN_EXPIRY_SECONDS: u64 = 300;

/// Longest expiring-link lifetime offered by the built-in tiers.
pub const DEFAULT_MAX_EXPIRY_SECONDS: u64 = 30_000;

/// Inclusive range of permitted expiring-link lifetimes, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRange {
    pub min_seconds: u64,
    pub max_seconds: u64,
}

impl ExpiryRange {
    /// Create a range without validating it; see [`TierPolicyBuilder::build`].
    pub const fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            max_seconds,
        }
    }

    pub fn contains(&self, seconds: u64) -> bool {
        self.min_seconds <= seconds && seconds <= self.max_seconds
    }

    fn is_valid(&self) -> bool {
        self.min_seconds >= 1 && self.min_seconds <= self.max_seconds
    }
}

impl Default for ExpiryRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_EXPIRY_SECONDS, DEFAULT_MAX_EXPIRY_SECONDS)
    }
}

/// Immutable description of one account tier's capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    name: String,
    exposable_sizes: BTreeSet<Representation>,
    expose_original: bool,
    /// `Some` iff the tier may mint expiring links.
    expiry_range: Option<ExpiryRange>,
}

impl TierPolicy {
    /// Start building a policy with the given tier name.
    pub fn builder(name: impl Into<String>) -> TierPolicyBuilder {
        TierPolicyBuilder {
            name: name.into(),
            exposable_sizes: BTreeSet::new(),
            expose_original: false,
            expiry_range: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exposable_sizes(&self) -> &BTreeSet<Representation> {
        &self.exposable_sizes
    }

    pub fn expose_original(&self) -> bool {
        self.expose_original
    }

    pub fn allow_expiring_links(&self) -> bool {
        self.expiry_range.is_some()
    }

    /// The permitted lifetime window, if expiring links are allowed.
    pub fn expiry_range(&self) -> Option<ExpiryRange> {
        self.expiry_range
    }

    /// Whether a caller on this tier may see `kind` at all.
    pub fn is_representation_exposable(&self, kind: &Representation) -> bool {
        self.exposable_sizes.contains(kind) || (kind.is_original() && self.expose_original)
    }

    /// Whether an expiring link of `seconds` may be minted on this tier.
    pub fn is_expiry_duration_valid(&self, seconds: u64) -> bool {
        self.expiry_range
            .map(|range| range.contains(seconds))
            .unwrap_or(false)
    }
}

/// Builder for [`TierPolicy`] that enforces its invariants on `build`.
#[derive(Debug, Clone)]
pub struct TierPolicyBuilder {
    name: String,
    exposable_sizes: BTreeSet<Representation>,
    expose_original: bool,
    expiry_range: Option<ExpiryRange>,
}

impl TierPolicyBuilder {
    /// Expose a derived representation.
    pub fn expose(mut self, kind: Representation) -> Self {
        self.exposable_sizes.insert(kind);
        self
    }

    pub fn expose_original(mut self, expose: bool) -> Self {
        self.expose_original = expose;
        self
    }

    /// Allow expiring links with lifetimes in `range`.
    pub fn expiring_links(mut self, range: ExpiryRange) -> Self {
        self.expiry_range = Some(range);
        self
    }

    pub fn build(self) -> Result<TierPolicy, PolicyError> {
        if self.name.trim().is_empty() {
            return Err(PolicyError::EmptyTierName);
        }
        if self.exposable_sizes.is_empty() {
            return Err(PolicyError::EmptyExposableSizes(self.name));
        }
        if let Some(range) = self.expiry_range {
            if !range.is_valid() {
                return Err(PolicyError::InvalidExpiryRange {
                    tier: self.name,
                    min: range.min_seconds,
                    max: range.max_seconds,
                });
            }
        }

        Ok(TierPolicy {
            name: self.name,
            exposable_sizes: self.exposable_sizes,
            expose_original: self.expose_original,
            expiry_range: self.expiry_range,
        })
    }
}

/// Serialized shape of a tier, as found in the tier catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDefinition {
    pub name: String,
    pub exposable_sizes: Vec<Representation>,
    #[serde(default)]
    pub expose_original: bool,
    #[serde(default)]
    pub allow_expiring_links: bool,
    /// Ignored unless `allow_expiring_links`; defaults to 300-30000 seconds.
    #[serde(default)]
    pub expiry_range: Option<ExpiryRange>,
}

impl TryFrom<TierDefinition> for TierPolicy {
    type Error = PolicyError;

    fn try_from(def: TierDefinition) -> Result<Self, Self::Error> {
        let mut builder = TierPolicy::builder(def.name).expose_original(def.expose_original);
        for kind in def.exposable_sizes {
            builder = builder.expose(kind);
        }
        if def.allow_expiring_links {
            builder = builder.expiring_links(def.expiry_range.unwrap_or_default());
        }
        builder.build()
    }
}

impl From<&TierPolicy> for TierDefinition {
    fn from(policy: &TierPolicy) -> Self {
        Self {
            name: policy.name.clone(),
            exposable_sizes: policy.exposable_sizes.iter().cloned().collect(),
            expose_original: policy.expose_original,
            allow_expiring_links: policy.allow_expiring_links(),
            expiry_range: policy.expiry_range,
        }
    }
}
