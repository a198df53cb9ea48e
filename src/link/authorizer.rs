//! Link authorization.
//!
//! Decides whether a caller on a given tier may get a link to a representation
//! of an image, and which kind of link. Checks run in a fixed order and the
//! first failure is reported:
//!
//! 1. the representation exists for the image
//! 2. the tier exposes it
//! 3. no expiry requested: static link
//! 4. the tier allows expiring links
//! 5. the requested lifetime is inside the tier's window

use serde::Serialize;

use crate::error::AuthorizeError;
use crate::image::ImageRecord;
use crate::tier::{Representation, TierPolicy};

/// Outcome of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// A plain, non-expiring link
    Static { representation: Representation },

    /// A signed link valid for `duration_seconds` from issuance
    Expiring {
        representation: Representation,
        duration_seconds: u64,
    },
}

impl Decision {
    pub fn representation(&self) -> &Representation {
        match self {
            Decision::Static { representation } => representation,
            Decision::Expiring { representation, .. } => representation,
        }
    }
}

/// Authorize a link request.
pub fn authorize(
    image: &ImageRecord,
    policy: &TierPolicy,
    representation: &Representation,
    expiry_seconds: Option<u64>,
) -> Result<Decision, AuthorizeError> {
    if !image.has_representation(representation) {
        return Err(AuthorizeError::RepresentationUnavailable {
            representation: representation.to_string(),
        });
    }

    if !policy.is_representation_exposable(representation) {
        return Err(AuthorizeError::TierForbidden {
            tier: policy.name().to_string(),
            representation: representation.clone(),
        });
    }

    let Some(seconds) = expiry_seconds else {
        return Ok(Decision::Static {
            representation: representation.clone(),
        });
    };

    let Some(range) = policy.expiry_range() else {
        return Err(AuthorizeError::ExpiringLinksNotAllowed {
            tier: policy.name().to_string(),
        });
    };

    if !policy.is_expiry_duration_valid(seconds) {
        return Err(AuthorizeError::ExpiryOutOfRange {
            requested: seconds,
            min: range.min_seconds,
            max: range.max_seconds,
        });
    }

    Ok(Decision::Expiring {
        representation: representation.clone(),
        duration_seconds: seconds,
    })
}
