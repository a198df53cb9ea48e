//! Tier-gated links.
//!
//! # Flow
//!
//! ```text
//!  link request ──► authorize(image, tier, rep, expiry?) ──► Static ──► plain URL
//!                                                       └──► Expiring ──► ExpiringLinkIssuer
//!                                                                             │ token
//!  fetch request (token) ──► ExpiringLinkVerifier ──► VerifiedLink ──► storage
//! ```
//!
//! Authorization, issuance and verification are pure functions of their
//! inputs. The only shared state is the [`SigningKey`], read-only after
//! startup. Tokens are never stored, so there is no way to revoke a single
//! token before it expires.

mod authorizer;
mod issuer;
mod key;
mod token;
mod verifier;

pub use authorizer::{authorize, Decision};
pub use issuer::ExpiringLinkIssuer;
pub use key::{SigningKey, MIN_SECRET_LEN, SIGNATURE_LEN};
pub use token::{ExpiringLinkToken, LinkClaims};
pub use verifier::{ExpiringLinkVerifier, VerifiedLink};
