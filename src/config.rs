//! Configuration for the server and the offline link tool.
//!
//! Command-line arguments via clap, each with an environment variable
//! fallback using the `ITL_` prefix:
//!
//! - `ITL_HOST` - Server bind address (default: 0.0.0.0)
//! - `ITL_PORT` - Server port (default: 3000)
//! - `ITL_SECRET` - HMAC secret for expiring links (required, at least 32 bytes)
//! - `ITL_TIERS_FILE` - JSON tier and account catalog (built-in tiers otherwise)
//! - `ITL_PUBLIC_URL` - Absolute base for emitted links
//! - `ITL_S3_BUCKET` - Bucket holding representation bytes (required)
//! - `ITL_S3_PREFIX` - Key prefix inside the bucket
//! - `ITL_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `ITL_S3_REGION` - AWS region (default: us-east-1)
//! - `ITL_CACHE_BYTES` - Delivery cache size in bytes, 0 disables it
//! - `ITL_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `ITL_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `ITL_CONCEAL_REPRESENTATIONS` - Report tier denials as 404

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::image::is_valid_image_id;
use crate::link::MIN_SECRET_LEN;
use crate::server::DEFAULT_CACHE_MAX_AGE;
use crate::storage::DEFAULT_CACHE_CAPACITY;
use crate::tier::Representation;

// =============================================================================
// Default Values
// =============================================================================

pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Default lifetime of links minted by `issue`, in seconds.
pub const DEFAULT_ISSUE_TTL: u64 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Tier Links - tier-gated static and expiring links to stored images.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-tier-links")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Mint an expiring link offline, without a running server.
    Issue(IssueConfig),
}

/// Options for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "ITL_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "ITL_PORT")]
    pub port: u16,

    /// Absolute base URL for emitted links (e.g. https://img.example.com).
    ///
    /// Links are relative paths when unset.
    #[arg(long, env = "ITL_PUBLIC_URL")]
    pub public_url: Option<String>,

    // =========================================================================
    // Links and Tiers
    // =========================================================================
    /// Secret key for signing expiring links. Rotating it invalidates every
    /// outstanding link.
    #[arg(long, env = "ITL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// JSON file with tier definitions and account assignments.
    #[arg(long, env = "ITL_TIERS_FILE")]
    pub tiers_file: Option<PathBuf>,

    /// Report tier denials as "representation unavailable" (404).
    #[arg(long, default_value_t = false, env = "ITL_CONCEAL_REPRESENTATIONS")]
    pub conceal_representations: bool,

    // =========================================================================
    // S3
    // =========================================================================
    /// S3 bucket holding representation bytes.
    #[arg(long, env = "ITL_S3_BUCKET")]
    pub s3_bucket: String,

    /// Key prefix; objects live at {prefix}{image_id}/{representation}.
    #[arg(long, default_value = "", env = "ITL_S3_PREFIX")]
    pub s3_prefix: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "ITL_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "ITL_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Caching
    // =========================================================================
    /// Delivery cache capacity in bytes (0 disables the cache).
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "ITL_CACHE_BYTES")]
    pub cache_bytes: usize,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "ITL_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS
    // =========================================================================
    /// Allowed CORS origins (comma-separated). Any origin when unset.
    #[arg(long, env = "ITL_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_secret(&self.secret)?;

        if self.s3_bucket.is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or ITL_S3_BUCKET".to_string());
        }

        if let Some(ref public_url) = self.public_url {
            validate_base_url(public_url, "public_url")?;
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Output format for `issue`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueOutputFormat {
    /// The bare token
    #[default]
    Token,

    /// The full fetch URL
    Url,

    /// JSON with token, URL and expiry
    Json,
}

/// Options for `issue`.
#[derive(Args, Debug, Clone)]
pub struct IssueConfig {
    /// Secret key; must match the server's.
    #[arg(long, env = "ITL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Image the link grants access to.
    #[arg(long)]
    pub image_id: String,

    /// Representation the link grants access to.
    #[arg(long, default_value = "original")]
    pub representation: String,

    /// Lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_ISSUE_TTL)]
    pub ttl: u64,

    /// Base URL for `url` and `json` output.
    #[arg(long, env = "ITL_PUBLIC_URL")]
    pub base_url: Option<String>,

    #[arg(long, value_enum, default_value_t = IssueOutputFormat::Token)]
    pub format: IssueOutputFormat,
}

impl IssueConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_secret(&self.secret)?;

        if !is_valid_image_id(&self.image_id) {
            return Err(format!("Invalid image id '{}'", self.image_id));
        }

        self.parsed_representation()?;

        if self.ttl == 0 {
            return Err("ttl must be greater than 0".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            validate_base_url(base_url, "base_url")?;
        }

        Ok(())
    }

    pub fn parsed_representation(&self) -> Result<Representation, String> {
        self.representation.parse().map_err(|e| format!("{}", e))
    }
}

fn validate_secret(secret: &str) -> Result<(), String> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(format!(
            "Secret must be at least {} bytes (got {}). Set --secret or ITL_SECRET",
            MIN_SECRET_LEN,
            secret.len()
        ));
    }
    Ok(())
}

fn validate_base_url(raw: &str, name: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("Invalid {}: {}", name, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Invalid {}: unsupported scheme '{}'", name, other)),
    }
}

// =============================================================================
// Tests
// =============================================================================
