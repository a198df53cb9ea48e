use tracing::debug;

use crate::error::Rejection;
use crate::tier::Representation;

use super::key::SigningKey;
use super::token::ExpiringLinkToken;

/// A token that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLink {
    pub image_id: String,
    pub representation: Representation,
    pub expires_at: u64,
}

/// Validates presented expiring-link tokens.
///
/// Checks, in order, with the first failure reported:
///
/// 1. the token decodes ([`Rejection::Malformed`])
/// 2. the signature matches, compared in constant time ([`Rejection::BadSignature`])
/// 3. `now <= expires_at` ([`Rejection::Expired`])
/// 4. it was minted for the requested image ([`Rejection::ImageMismatch`])
/// 5. and for the requested representation ([`Rejection::RepresentationMismatch`])
///
/// The expected representation is taken as a plain name, so a request naming
/// something that is not a valid representation is a mismatch too.
#[derive(Debug, Clone)]
pub struct ExpiringLinkVerifier {
    key: SigningKey,
}

impl ExpiringLinkVerifier {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn verify(
        &self,
        token: &str,
        expected_image_id: &str,
        expected_representation: impl AsRef<str>,
        now: u64,
    ) -> Result<VerifiedLink, Rejection> {
        let token = ExpiringLinkToken::decode(token)?;

        if !token.has_valid_signature(&self.key) {
            return Err(Rejection::BadSignature);
        }

        if now > token.expires_at() {
            return Err(Rejection::Expired {
                expired_at: token.expires_at(),
                current_time: now,
            });
        }

        if token.image_id() != expected_image_id {
            debug!(
                token_image = token.image_id(),
                requested_image = expected_image_id,
                "Token replayed against another image"
            );
            return Err(Rejection::ImageMismatch);
        }

        if token.representation().as_str() != expected_representation.as_ref() {
            return Err(Rejection::RepresentationMismatch);
        }

        let claims = token.claims();
        Ok(VerifiedLink {
            image_id: claims.image_id.clone(),
            representation: claims.representation.clone(),
            expires_at: claims.expires_at,
        })
    }
}
