//! Expiring-link token wire format.
//!
//! ```text
//! token   = base64url(payload) "." base64url(signature)
//! payload = {"exp":<unix seconds>,"img":"<image id>","rep":"<representation>"}
//! ```
//!
//! Both halves use the unpadded URL-safe base64 alphabet, which never contains
//! `.`, so the token can be placed in a query string as-is. The payload is the
//! canonical JSON of the claims (keys sorted) and the signature is
//! HMAC-SHA256 over exactly those payload bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::error::Rejection;
use crate::tier::Representation;

use super::key::{SigningKey, SIGNATURE_LEN};

/// Longest token accepted for decoding.
const MAX_TOKEN_LEN: usize = 2048;

/// The fields a token vouches for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkClaims {
    #[serde(rename = "img")]
    pub image_id: String,

    #[serde(rename = "rep")]
    pub representation: Representation,

    /// Last valid instant, Unix epoch seconds
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

impl LinkClaims {
    /// Canonical payload bytes covered by the signature.
    pub fn to_payload(&self) -> Vec<u8> {
        json!({
            "img": self.image_id,
            "rep": self.representation.as_str(),
            "exp": self.expires_at,
        })
        .to_string()
        .into_bytes()
    }
}

/// A signed, self-contained expiring link token.
///
/// Nothing about issued tokens is stored server-side; validity is recomputed
/// from the token contents and the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringLinkToken {
    claims: LinkClaims,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl ExpiringLinkToken {
    /// Sign a set of claims.
    pub fn sign(claims: LinkClaims, key: &SigningKey) -> Self {
        let payload = claims.to_payload();
        let signature = key.sign(&payload).to_vec();
        Self {
            claims,
            payload,
            signature,
        }
    }

    /// Decode the wire form. Does not check the signature.
    pub fn decode(token: &str) -> Result<Self, Rejection> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(Rejection::Malformed("token too long".to_string()));
        }

        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| Rejection::Malformed("missing separator".to_string()))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| Rejection::Malformed(format!("payload: {}", e)))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| Rejection::Malformed(format!("signature: {}", e)))?;

        if signature.len() != SIGNATURE_LEN {
            return Err(Rejection::Malformed(format!(
                "signature is {} bytes, expected {}",
                signature.len(),
                SIGNATURE_LEN
            )));
        }

        let claims: LinkClaims = serde_json::from_slice(&payload)
            .map_err(|e| Rejection::Malformed(format!("claims: {}", e)))?;

        Ok(Self {
            claims,
            payload,
            signature,
        })
    }

    /// Encode to the URL-safe wire form.
    pub fn encode(&self) -> String {
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&self.payload),
            URL_SAFE_NO_PAD.encode(&self.signature)
        )
    }

    /// Whether the signature matches the payload under `key` (constant time).
    pub fn has_valid_signature(&self, key: &SigningKey) -> bool {
        key.verify(&self.payload, &self.signature)
    }

    pub fn claims(&self) -> &LinkClaims {
        &self.claims
    }

    pub fn image_id(&self) -> &str {
        &self.claims.image_id
    }

    pub fn representation(&self) -> &Representation {
        &self.claims.representation
    }

    pub fn expires_at(&self) -> u64 {
        self.claims.expires_at
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}
