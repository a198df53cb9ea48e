//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /images` - List the caller's images with the links their tier allows
//! - `POST /images` - Register an upload
//! - `PUT /images/{image_id}/representations/{kind}` - Mark a derived representation ready
//! - `GET /images/{image_id}/representations/{kind}` - Static delivery to the owner
//! - `GET /images/{image_id}/link` - Request a static or expiring link
//! - `GET /images/{image_id}/fetch` - Redeem an expiring link (no identity needed)

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthorizeError, CatalogError, PolicyError, Rejection, StoreError};
use crate::image::{check_content_type, ImageCatalog, ImageRecord};
use crate::link::{authorize, Decision, ExpiringLinkIssuer, ExpiringLinkVerifier, SigningKey};
use crate::storage::{ObjectStore, StoredObject};
use crate::tier::{ExpiryRange, Representation, TierDirectory, TierPolicy};

use super::principal::Principal;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Tier catalog and account assignments
    pub directory: Arc<TierDirectory>,

    /// Image metadata
    pub catalog: Arc<dyn ImageCatalog>,

    /// Representation bytes
    pub store: Arc<dyn ObjectStore>,

    pub issuer: ExpiringLinkIssuer,
    pub verifier: ExpiringLinkVerifier,

    /// Time source for issuance and verification
    pub clock: Arc<dyn Clock>,

    /// Absolute base for emitted links; relative paths when unset
    pub public_url: Option<String>,

    /// Upper bound for Cache-Control max-age on delivered bytes
    pub cache_max_age: u32,

    /// Report tier denials as plain unavailability
    pub conceal_representations: bool,
}

impl AppState {
    pub fn new(
        directory: TierDirectory,
        catalog: Arc<dyn ImageCatalog>,
        store: Arc<dyn ObjectStore>,
        key: SigningKey,
    ) -> Self {
        Self {
            directory: Arc::new(directory),
            catalog,
            store,
            issuer: ExpiringLinkIssuer::new(key.clone()),
            verifier: ExpiringLinkVerifier::new(key),
            clock: Arc::new(SystemClock),
            public_url: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            conceal_representations: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        self.public_url = Some(public_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn with_conceal_representations(mut self, conceal: bool) -> Self {
        self.conceal_representations = conceal;
        self
    }

    fn base_url(&self) -> &str {
        self.public_url.as_deref().unwrap_or("")
    }

    /// URL of the owner-only static delivery endpoint.
    pub fn static_url(&self, image_id: &str, representation: &Representation) -> String {
        format!(
            "{}/images/{}/representations/{}",
            self.base_url(),
            image_id,
            representation
        )
    }

    /// URL redeeming an expiring-link token.
    pub fn expiring_url(&self, image_id: &str, representation: &Representation, token: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("representation", representation.as_str())
            .append_pair("token", token)
            .finish();
        format!("{}/images/{}/fetch?{}", self.base_url(), image_id, query)
    }

    /// Look up an image the caller owns. Other owners' images are reported as
    /// missing so ids do not leak.
    async fn owned_image(
        &self,
        principal: &Principal,
        image_id: &str,
    ) -> Result<ImageRecord, HandlerError> {
        let record = self.catalog.get(image_id).await?;
        if !record.is_owned_by(&principal.account_id) {
            debug!(
                image_id,
                account = %principal.account_id,
                "Image requested by non-owner"
            );
            return Err(CatalogError::ImageNotFound(image_id.to_string()).into());
        }
        Ok(record)
    }

    fn conceal(&self, err: AuthorizeError) -> AuthorizeError {
        match err {
            AuthorizeError::TierForbidden { representation, .. } if self.conceal_representations => {
                AuthorizeError::RepresentationUnavailable {
                    representation: representation.to_string(),
                }
            }
            other => other,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Body of `POST /images`.
///
/// Ids are always assigned by the server; any `id` field in the body is ignored.
#[derive(Debug, Deserialize)]
pub struct RegisterImageRequest {
    /// Declared content type of the upload
    pub content_type: String,
}

/// Query parameters for link requests.
#[derive(Debug, Deserialize)]
pub struct LinkQueryParams {
    pub representation: String,

    /// Requested lifetime in seconds, raw; absent for a static link
    #[serde(rename = "expiresIn", default)]
    pub expires_in: Option<String>,
}

impl LinkQueryParams {
    /// The requested lifetime.
    ///
    /// Anything that is not a non-negative integer fitting in `u64` (negative,
    /// overflowing, text) is requested as 0 seconds, which no expiry range
    /// contains, so it is refused by the tier checks like any other bad lifetime.
    pub fn requested_expiry(&self) -> Option<u64> {
        self.expires_in
            .as_deref()
            .map(|raw| raw.trim().parse().unwrap_or(0))
    }
}

/// Query parameters for redeeming an expiring link.
///
/// Both fields are optional at the query layer so that a missing value is
/// reported by the verifier rather than as a query parse failure.
#[derive(Debug, Deserialize)]
pub struct FetchQueryParams {
    #[serde(default)]
    pub representation: String,

    #[serde(default)]
    pub token: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "link_expired", "tier_forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response to a link request.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    /// `static` or `expiring`
    pub kind: String,

    pub representation: Representation,

    pub url: String,

    /// Unix epoch seconds, expiring links only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

/// A static link to one representation.
#[derive(Debug, Serialize)]
pub struct StaticLink {
    pub representation: Representation,
    pub url: String,
}

/// One entry of the image listing.
#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub id: String,
    pub created_at: u64,

    /// Everything generated so far, exposable or not
    pub available: Vec<Representation>,

    /// Static links for what the caller's tier exposes
    pub links: Vec<StaticLink>,

    /// Allowed lifetimes when the tier has expiring links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiring_links: Option<ExpiryRange>,
}

/// Response from the image list endpoint.
#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    /// Tier the listing was computed for
    pub tier: String,
    pub images: Vec<ImageSummary>,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn json_error(status: StatusCode, error_type: &str, message: String) -> Response {
    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

/// Log by severity and build the JSON error body.
///
/// Policy denials and missing resources are routine and go to DEBUG; 5xx goes
/// to ERROR.
fn respond(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }
    json_error(status, error_type, message)
}

impl IntoResponse for AuthorizeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AuthorizeError::RepresentationUnavailable { .. } => {
                (StatusCode::NOT_FOUND, "representation_unavailable")
            }
            AuthorizeError::TierForbidden { .. } => (StatusCode::FORBIDDEN, "tier_forbidden"),
            AuthorizeError::ExpiringLinksNotAllowed { .. } => {
                (StatusCode::FORBIDDEN, "expiring_links_not_allowed")
            }
            AuthorizeError::ExpiryOutOfRange { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "expiry_out_of_range")
            }
        };
        respond(status, error_type, self.to_string())
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Rejection::Malformed(_) => (StatusCode::BAD_REQUEST, "malformed_token"),
            Rejection::BadSignature => (StatusCode::FORBIDDEN, "invalid_signature"),
            Rejection::Expired { .. } => (StatusCode::GONE, "link_expired"),
            Rejection::ImageMismatch => (StatusCode::FORBIDDEN, "image_mismatch"),
            Rejection::RepresentationMismatch => {
                (StatusCode::FORBIDDEN, "representation_mismatch")
            }
        };
        let message = self.to_string();

        // Forged or replayed tokens could indicate an attack; expiry is routine
        match &self {
            Rejection::Malformed(_) | Rejection::Expired { .. } => {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Link rejected: {}",
                    message
                );
            }
            _ => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Link rejected: {}",
                    message
                );
            }
        }

        json_error(status, error_type, message)
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            StoreError::S3(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            StoreError::Connection(_) => (StatusCode::BAD_GATEWAY, "connection_error"),
        };
        respond(status, error_type, self.to_string())
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            CatalogError::ImageNotFound(_) => (StatusCode::NOT_FOUND, "image_not_found"),
            CatalogError::AlreadyExists(_) => (StatusCode::CONFLICT, "image_exists"),
            CatalogError::UnsupportedContentType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type")
            }
        };
        respond(status, error_type, self.to_string())
    }
}

/// Any error a handler can return.
#[derive(Debug)]
pub enum HandlerError {
    Authorize(AuthorizeError),
    Rejected(Rejection),
    Store(StoreError),
    Catalog(CatalogError),
    InvalidRequest(String),

    /// The request could not be extracted (query string or JSON body)
    Extraction { status: StatusCode, message: String },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Authorize(err) => err.into_response(),
            HandlerError::Rejected(err) => err.into_response(),
            HandlerError::Store(err) => err.into_response(),
            HandlerError::Catalog(err) => err.into_response(),
            HandlerError::InvalidRequest(message) => {
                respond(StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            HandlerError::Extraction { status, message } => {
                respond(status, "invalid_request", message)
            }
        }
    }
}

impl From<AuthorizeError> for HandlerError {
    fn from(err: AuthorizeError) -> Self {
        HandlerError::Authorize(err)
    }
}

impl From<Rejection> for HandlerError {
    fn from(err: Rejection) -> Self {
        HandlerError::Rejected(err)
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        HandlerError::Store(err)
    }
}

impl From<CatalogError> for HandlerError {
    fn from(err: CatalogError) -> Self {
        HandlerError::Catalog(err)
    }
}

impl From<QueryRejection> for HandlerError {
    fn from(rejection: QueryRejection) -> Self {
        HandlerError::Extraction {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for HandlerError {
    fn from(rejection: JsonRejection) -> Self {
        HandlerError::Extraction {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

fn parse_representation(raw: &str) -> Result<Representation, HandlerError> {
    raw.parse()
        .map_err(|e: PolicyError| HandlerError::InvalidRequest(e.to_string()))
}

/// A name that fails validation cannot have been generated for any image.
fn requested_representation(raw: &str) -> Result<Representation, AuthorizeError> {
    raw.parse()
        .map_err(|_: PolicyError| AuthorizeError::RepresentationUnavailable {
            representation: raw.to_string(),
        })
}

fn object_response(object: StoredObject, max_age: u64) -> Response {
    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, format!("private, max-age={}", max_age)),
        ],
        object.data,
    )
        .into_response()
}

fn summarize(state: &AppState, record: &ImageRecord, policy: &TierPolicy) -> ImageSummary {
    let links = record
        .available
        .iter()
        .filter(|rep| authorize(record, policy, rep, None).is_ok())
        .map(|rep| StaticLink {
            representation: rep.clone(),
            url: state.static_url(&record.id, rep),
        })
        .collect();

    ImageSummary {
        id: record.id.clone(),
        created_at: record.created_at,
        available: record.available.iter().cloned().collect(),
        links,
        expiring_links: policy.expiry_range(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List the caller's images, newest first.
///
/// # Endpoint
///
/// `GET /images`
///
/// Each entry carries static links for the representations the caller's tier
/// exposes among those generated so far.
pub async fn list_images_handler(
    State(state): State<AppState>,
    principal: Principal,
) -> Json<ImageListResponse> {
    let policy = state.directory.resolve(&principal.account_id);
    let records = state.catalog.list_by_owner(&principal.account_id).await;

    let images = records
        .iter()
        .map(|record| summarize(&state, record, &policy))
        .collect();

    Json(ImageListResponse {
        tier: policy.name().to_string(),
        images,
    })
}

/// Register an upload.
///
/// # Endpoint
///
/// `POST /images` with `{"content_type": "image/png"}`
///
/// The id is always a fresh UUID assigned here.
///
/// # Response
///
/// - `201 Created`: the new record, with only `original` available
/// - `415 Unsupported Media Type`: not JPEG or PNG
pub async fn register_image_handler(
    State(state): State<AppState>,
    principal: Principal,
    request: Result<Json<RegisterImageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ImageRecord>), HandlerError> {
    let Json(request) = request?;
    check_content_type(&request.content_type)?;

    let id = Uuid::new_v4().to_string();
    let record = ImageRecord::new(id, principal.account_id, state.clock.now());
    state.catalog.register(record.clone()).await?;

    info!(
        image_id = %record.id,
        owner = %record.owner_id,
        "Image registered"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// Mark a derived representation as generated.
///
/// # Endpoint
///
/// `PUT /images/{image_id}/representations/{kind}`
pub async fn mark_available_handler(
    State(state): State<AppState>,
    principal: Principal,
    Path((image_id, kind)): Path<(String, String)>,
) -> Result<Json<ImageRecord>, HandlerError> {
    state.owned_image(&principal, &image_id).await?;
    let kind = parse_representation(&kind)?;

    let record = state.catalog.mark_available(&image_id, kind.clone()).await?;
    debug!(image_id = %image_id, representation = %kind, "Representation available");

    Ok(Json(record))
}

/// Serve a representation to its owner through a static link.
///
/// # Endpoint
///
/// `GET /images/{image_id}/representations/{kind}`
///
/// # Response
///
/// - `200 OK`: the bytes
/// - `403 Forbidden`: the caller's tier does not expose this representation
/// - `404 Not Found`: unknown image, not owned, or not generated yet
pub async fn representation_handler(
    State(state): State<AppState>,
    principal: Principal,
    Path((image_id, kind)): Path<(String, String)>,
) -> Result<Response, HandlerError> {
    let image = state.owned_image(&principal, &image_id).await?;
    let kind = requested_representation(&kind)?;
    let policy = state.directory.resolve(&principal.account_id);

    let decision = authorize(&image, &policy, &kind, None).map_err(|e| state.conceal(e))?;

    let object = state.store.fetch(&image.id, decision.representation()).await?;
    Ok(object_response(object, u64::from(state.cache_max_age)))
}

/// Request a link to a representation.
///
/// # Endpoint
///
/// `GET /images/{image_id}/link?representation={kind}[&expiresIn={seconds}]`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "kind": "expiring",
///   "representation": "original",
///   "url": "https://img.example.com/images/abc/fetch?representation=original&token=...",
///   "expires_at": 1735689600
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: tier does not expose the representation, or has no expiring links
/// - `404 Not Found`: unknown image, not owned, or representation not generated
/// - `422 Unprocessable Entity`: `expiresIn` outside the tier's range, including
///   negative or non-numeric values
pub async fn link_handler(
    State(state): State<AppState>,
    principal: Principal,
    Path(image_id): Path<String>,
    query: Result<Query<LinkQueryParams>, QueryRejection>,
) -> Result<Json<LinkResponse>, HandlerError> {
    let Query(query) = query?;
    let image = state.owned_image(&principal, &image_id).await?;
    let representation = requested_representation(&query.representation)?;
    let policy = state.directory.resolve(&principal.account_id);

    let decision = authorize(&image, &policy, &representation, query.requested_expiry())
        .map_err(|e| state.conceal(e))?;

    let response = match decision {
        Decision::Static { representation } => LinkResponse {
            kind: "static".to_string(),
            url: state.static_url(&image.id, &representation),
            representation,
            expires_at: None,
        },
        Decision::Expiring {
            representation,
            duration_seconds,
        } => {
            let token = state.issuer.issue(
                &image.id,
                &representation,
                duration_seconds,
                state.clock.now(),
            );
            debug!(
                image_id = %image.id,
                representation = %representation,
                expires_at = token.expires_at(),
                "Expiring link issued"
            );
            LinkResponse {
                kind: "expiring".to_string(),
                url: state.expiring_url(&image.id, &representation, &token.encode()),
                representation,
                expires_at: Some(token.expires_at()),
            }
        }
    };

    Ok(Json(response))
}

/// Redeem an expiring link.
///
/// # Endpoint
///
/// `GET /images/{image_id}/fetch?representation={kind}&token={token}`
///
/// The token is the only credential; no account header is needed.
///
/// # Response
///
/// - `200 OK`: the bytes, cacheable no longer than the token lives
/// - `400 Bad Request`: malformed or missing token
/// - `403 Forbidden`: bad signature, or token minted for another image/representation
/// - `410 Gone`: token expired
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
    query: Result<Query<FetchQueryParams>, QueryRejection>,
) -> Result<Response, HandlerError> {
    let Query(query) = query?;
    let token = query
        .token
        .ok_or_else(|| Rejection::Malformed("missing token".to_string()))?;
    let now = state.clock.now();

    // The representation stays a raw string here: a name that is not even
    // valid can only be a mismatch against a signed token
    let link = state
        .verifier
        .verify(&token, &image_id, &query.representation, now)?;

    let object = state.store.fetch(&link.image_id, &link.representation).await?;

    let remaining = link.expires_at.saturating_sub(now);
    Ok(object_response(
        object,
        remaining.min(u64::from(state.cache_max_age)),
    ))
}

// =============================================================================
// Tests
// =============================================================================
