//! Authenticated caller identity.
//!
//! Login is handled upstream: an authenticating gateway sets the
//! [`ACCOUNT_HEADER`] on every request it forwards. Requests without it are
//! rejected with `401 Unauthorized`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::handlers::ErrorResponse;

/// Header carrying the authenticated account id.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// The account making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: String,
}

/// Missing or unusable identity header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        let message = format!("Missing or empty {} header", ACCOUNT_HEADER);
        debug!(
            error_type = "unauthenticated",
            status = status.as_u16(),
            "Client error: {}",
            message
        );
        (
            status,
            Json(ErrorResponse::with_status("unauthenticated", message, status)),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = parts
            .headers
            .get(ACCOUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(Unauthenticated)?;

        Ok(Principal {
            account_id: account_id.to_string(),
        })
    }
}
