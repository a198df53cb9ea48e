use crate::tier::Representation;

use super::key::SigningKey;
use super::token::{ExpiringLinkToken, LinkClaims};

/// Mints signed expiring-link tokens.
///
/// Stateless: nothing is recorded about issued tokens, and the current time is
/// always passed in, so identical inputs always produce identical tokens.
#[derive(Debug, Clone)]
pub struct ExpiringLinkIssuer {
    key: SigningKey,
}

impl ExpiringLinkIssuer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Issue a token for `representation` of `image_id`, valid until
    /// `now + duration_seconds` inclusive.
    pub fn issue(
        &self,
        image_id: &str,
        representation: &Representation,
        duration_seconds: u64,
        now: u64,
    ) -> ExpiringLinkToken {
        let claims = LinkClaims {
            image_id: image_id.to_string(),
            representation: representation.clone(),
            expires_at: now.saturating_add(duration_seconds),
        };
        ExpiringLinkToken::sign(claims, &self.key)
    }
}
