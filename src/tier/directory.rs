//! Account-to-tier lookup.
//!
//! The directory is loaded once at startup (from a JSON catalog file or the
//! built-in defaults) and is read-only afterwards. Each request resolves its
//! account to an `Arc<TierPolicy>` snapshot and keeps using that snapshot for
//! the rest of the request.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PolicyError;

use super::policy::{ExpiryRange, TierDefinition, TierPolicy};
use super::Representation;

/// Name of the tier unknown accounts fall back to when none is configured.
pub const DEFAULT_TIER_NAME: &str = "Basic";

/// Serialized tier catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCatalogFile {
    #[serde(default = "default_tier_name")]
    pub default_tier: String,

    pub tiers: Vec<TierDefinition>,

    #[serde(default)]
    pub accounts: Vec<AccountAssignment>,
}

fn default_tier_name() -> String {
    DEFAULT_TIER_NAME.to_string()
}

/// One account's tier assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountAssignment {
    pub id: String,
    pub tier: String,
}

/// Read-only mapping from account identifiers to tier policies.
#[derive(Debug, Clone)]
pub struct TierDirectory {
    tiers: HashMap<String, Arc<TierPolicy>>,
    accounts: HashMap<String, String>,
    default_tier: Arc<TierPolicy>,
}

impl TierDirectory {
    /// Build a directory from validated policies.
    ///
    /// Fails if two tiers share a name or `default_tier` names no tier.
    pub fn new(
        policies: impl IntoIterator<Item = TierPolicy>,
        default_tier: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        let mut tiers = HashMap::new();
        for policy in policies {
            let name = policy.name().to_string();
            if tiers.insert(name.clone(), Arc::new(policy)).is_some() {
                return Err(PolicyError::DuplicateTier(name));
            }
        }

        let default_name = default_tier.into();
        let Some(default_tier) = tiers.get(&default_name).cloned() else {
            return Err(PolicyError::UnknownTier {
                tier: default_name,
                referenced_by: "default_tier".to_string(),
            });
        };

        Ok(Self {
            tiers,
            accounts: HashMap::new(),
            default_tier,
        })
    }

    /// The Basic / Premium / Enterprise tiers with no account assignments.
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::new(builtin_tiers()?, DEFAULT_TIER_NAME)
    }

    /// Assign an account to an existing tier.
    pub fn with_account(
        mut self,
        account_id: impl Into<String>,
        tier: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        let account_id = account_id.into();
        let tier = tier.into();
        if !self.tiers.contains_key(&tier) {
            return Err(PolicyError::UnknownTier {
                tier,
                referenced_by: format!("account '{}'", account_id),
            });
        }
        self.accounts.insert(account_id, tier);
        Ok(self)
    }

    /// Parse and validate a JSON tier catalog.
    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        let file: TierCatalogFile =
            serde_json::from_str(json).map_err(|e| PolicyError::Parse(e.to_string()))?;
        Self::from_catalog(file)
    }

    /// Load a JSON tier catalog from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PolicyError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    fn from_catalog(file: TierCatalogFile) -> Result<Self, PolicyError> {
        let policies = file
            .tiers
            .into_iter()
            .map(TierPolicy::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut directory = Self::new(policies, file.default_tier)?;

        let mut seen = HashSet::new();
        for assignment in file.accounts {
            if !seen.insert(assignment.id.clone()) {
                debug!(account = %assignment.id, "Account listed twice, last assignment wins");
            }
            directory = directory.with_account(assignment.id, assignment.tier)?;
        }

        Ok(directory)
    }

    /// Resolve an account to its tier snapshot.
    ///
    /// Accounts without an explicit assignment get the default tier.
    pub fn resolve(&self, account_id: &str) -> Arc<TierPolicy> {
        self.accounts
            .get(account_id)
            .and_then(|tier| self.tiers.get(tier))
            .unwrap_or(&self.default_tier)
            .clone()
    }

    /// Look up a tier by name.
    pub fn tier(&self, name: &str) -> Option<Arc<TierPolicy>> {
        self.tiers.get(name).cloned()
    }

    pub fn default_tier(&self) -> &TierPolicy {
        &self.default_tier
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

/// The three tiers every fresh deployment starts with.
pub fn builtin_tiers() -> Result<Vec<TierPolicy>, PolicyError> {
    let thumb200 = Representation::new("thumb200")?;
    let thumb400 = Representation::new("thumb400")?;

    Ok(vec![
        TierPolicy::builder("Basic").expose(thumb200.clone()).build()?,
        TierPolicy::builder("Premium")
            .expose(thumb200.clone())
            .expose(thumb400.clone())
            .expose_original(true)
            .build()?,
        TierPolicy::builder("Enterprise")
            .expose(thumb200)
            .expose(thumb400)
            .expose_original(true)
            .expiring_links(ExpiryRange::default())
            .build()?,
    ])
}
