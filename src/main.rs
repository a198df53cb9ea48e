//! Image Tier Links - tier-gated access to stored images.
//!
//! This binary starts the HTTP server, or mints expiring links offline.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_tier_links::{
    config::{Cli, Command, IssueConfig, IssueOutputFormat, ServeConfig},
    create_s3_client,
    image::InMemoryImageCatalog,
    link::{ExpiringLinkIssuer, SigningKey},
    server::{create_router, AppState, RouterConfig},
    storage::{CachedStore, ObjectStore, S3ObjectStore},
    tier::TierDirectory,
    Clock, SystemClock,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Issue(config) => run_issue(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let directory = match config.tiers_file {
        Some(ref path) => match TierDirectory::load(path) {
            Ok(directory) => directory,
            Err(e) => {
                error!("Failed to load tiers from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => match TierDirectory::builtin() {
            Ok(directory) => directory,
            Err(e) => {
                error!("Failed to build built-in tiers: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let key = SigningKey::new(&config.secret);

    info!("image-tier-links v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!(
        "  Tiers: {} ({} account assignment(s), default '{}')",
        directory.tier_count(),
        directory.account_count(),
        directory.default_tier().name()
    );
    if config.tiers_file.is_none() {
        info!("        built-in Basic / Premium / Enterprise");
    }
    info!("  Signing key: fingerprint {}", key.fingerprint());
    info!("  S3 bucket: {}", config.s3_bucket);
    if !config.s3_prefix.is_empty() {
        info!("  S3 prefix: {}", config.s3_prefix);
    }
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    if config.cache_bytes == 0 {
        info!("  Cache: disabled");
    } else {
        info!("  Cache: {}MB", config.cache_bytes / (1024 * 1024));
    }
    if config.conceal_representations {
        info!("  Tier denials reported as 404");
    }
    if config.public_url.is_none() {
        warn!("  No public URL set; emitted links are relative paths");
    }

    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let s3_store = S3ObjectStore::new(s3_client, config.s3_bucket.clone(), config.s3_prefix.clone());

    let store: Arc<dyn ObjectStore> = if config.cache_bytes == 0 {
        Arc::new(s3_store)
    } else {
        Arc::new(CachedStore::with_capacity(s3_store, config.cache_bytes))
    };

    let mut state = AppState::new(directory, Arc::new(InMemoryImageCatalog::new()), store, key)
        .with_cache_max_age(config.cache_max_age)
        .with_conceal_representations(config.conceal_representations);
    if let Some(ref public_url) = config.public_url {
        state = state.with_public_url(public_url.clone());
    }

    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl -H 'x-account-id: <account>' http://{}/images", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_tier_links=debug,tower_http=debug"
    } else {
        "image_tier_links=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Issue Command
// =============================================================================

fn run_issue(config: IssueConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let representation = match config.parsed_representation() {
        Ok(representation) => representation,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let issuer = ExpiringLinkIssuer::new(SigningKey::new(&config.secret));
    let token = issuer.issue(&config.image_id, &representation, config.ttl, SystemClock.now());
    let encoded = token.encode();

    let path = format!(
        "/images/{}/fetch?representation={}&token={}",
        config.image_id, representation, encoded
    );
    let url = config
        .base_url
        .as_deref()
        .map(|base| format!("{}{}", base.trim_end_matches('/'), path));

    match config.format {
        IssueOutputFormat::Token => {
            println!("{}", encoded);
        }
        IssueOutputFormat::Url => match url {
            Some(url) => println!("{}", url),
            None => {
                println!("{}", path);
                eprintln!();
                eprintln!("Tip: Use --base-url to generate a complete URL");
            }
        },
        IssueOutputFormat::Json => {
            let json = serde_json::json!({
                "token": encoded,
                "image_id": config.image_id,
                "representation": representation,
                "expires_at": token.expires_at(),
                "ttl": config.ttl,
                "path": path,
                "url": url,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
