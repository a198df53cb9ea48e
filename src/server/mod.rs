//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     GET /images/{id}/link      GET /images/{id}/fetch           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │  principal  │  │        routes           │  │
//! │  │ (requests)  │  │ (x-account) │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └───────────────┬─────────────────────────────────────────────────┘
//!                 │
//!       tier directory ─ link authorizer ─ issuer / verifier ─ storage
//! ```

pub mod handlers;
pub mod principal;
pub mod routes;

pub use handlers::{
    fetch_handler, health_handler, link_handler, list_images_handler, mark_available_handler,
    register_image_handler, representation_handler, AppState, ErrorResponse, FetchQueryParams,
    HandlerError, HealthResponse, ImageListResponse, ImageSummary, LinkQueryParams, LinkResponse,
    RegisterImageRequest, StaticLink, DEFAULT_CACHE_MAX_AGE,
};
pub use principal::{Principal, Unauthenticated, ACCOUNT_HEADER};
pub use routes::{create_router, RouterConfig};
