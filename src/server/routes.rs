//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /health                                      GET   - Health check (public)
//! /images                                      GET   - List caller's images
//!                                              POST  - Register an upload
//! /images/{image_id}/representations/{kind}    GET   - Static delivery (owner)
//!                                              PUT   - Mark representation available
//! /images/{image_id}/link                      GET   - Request a link
//! /images/{image_id}/fetch                     GET   - Redeem an expiring link (public)
//! ```
//!
//! Identity comes from the [`ACCOUNT_HEADER`](super::principal::ACCOUNT_HEADER)
//! set by the upstream gateway; every route except `/health` and `fetch`
//! rejects requests without it.
//!
//! # Example
//!
//! ```ignore
//! let state = AppState::new(TierDirectory::builtin()?, catalog, store, key);
//! let router = create_router(state, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::{HeaderName, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    fetch_handler, health_handler, link_handler, list_images_handler, mark_available_handler,
    register_image_handler, representation_handler, AppState,
};
use super::principal::ACCOUNT_HEADER;

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Any CORS origin, tracing on.
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the application router.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/images",
            get(list_images_handler).post(register_image_handler),
        )
        .route(
            "/images/{image_id}/representations/{kind}",
            get(representation_handler).put(mark_available_handler),
        )
        .route("/images/{image_id}/link", get(link_handler))
        .route("/images/{image_id}/fetch", get(fetch_handler))
        .with_state(state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(ACCOUNT_HEADER)])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        // No origins: effectively disables CORS
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}
