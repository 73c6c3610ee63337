//! Configuration management for the resize service.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `RESIZE_` prefix
//! - Sensible defaults for all settings
//!
//! # Commands
//!
//! ```text
//! resize-service [serve] [OPTIONS]    run the HTTP server (default)
//! resize-service prune --prefix P     apply retention to one family once
//! ```
//!
//! # Environment Variables
//!
//! - `RESIZE_HOST` - Server bind address (default: 0.0.0.0)
//! - `RESIZE_PORT` - Server port (default: 8000)
//! - `RESIZE_STATIC_DIR` - Artifact directory (default: static)
//! - `RESIZE_STATIC_URL_PREFIX` - URL the directory is served under (default: /static)
//! - `RESIZE_API_PREFIX` - URL the API is mounted under (default: /api/resize)
//! - `RESIZE_MAX_UPLOAD_BYTES` - Upload size cap (default: 10 MiB)
//! - `RESIZE_INFER_CONTENT_TYPE` - Fall back to the file extension for unknown types
//! - `RESIZE_DEFAULT_QUALITY` - Default encode quality (default: 85)
//! - `RESIZE_CACHE_MAX_AGE` - Cache hint max-age seconds (default: 600)
//! - `RESIZE_STALE_WHILE_REVALIDATE` - Cache hint swr seconds (default: 3600)
//! - `RESIZE_KEEP_RESIZE`, `RESIZE_KEEP_CONVERTED`, `RESIZE_KEEP_SHARPEN`,
//!   `RESIZE_KEEP_ENHANCED` - Artifacts kept per family (default: 1, 1, 3, 3)
//! - `RESIZE_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::artifact::ArtifactStore;
use crate::imaging::{is_valid_quality, DEFAULT_QUALITY};
use crate::server::{RouterConfig, DEFAULT_API_PREFIX, DEFAULT_STATIC_URL_PREFIX};
use crate::service::{ImageService, RetentionPolicy};
use crate::upload::{UploadPolicy, DEFAULT_MAX_UPLOAD_BYTES};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default artifact directory.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Default cache hint max-age in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u32 = 600;

/// Default cache hint stale-while-revalidate in seconds.
pub const DEFAULT_STALE_WHILE_REVALIDATE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Resize Service - resize, convert and enhance images over HTTP.
///
/// Results are written to a static directory and served from it; only the
/// newest few artifacts of each kind are kept.
#[derive(Parser, Debug, Clone)]
#[command(name = "resize-service")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The command to run; no subcommand means `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Prune one artifact family and exit.
    Prune(PruneConfig),
}

/// Server configuration.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RESIZE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RESIZE_PORT")]
    pub port: u16,

    /// URL path the image API is mounted under.
    #[arg(long, default_value = DEFAULT_API_PREFIX, env = "RESIZE_API_PREFIX")]
    pub api_prefix: String,

    // =========================================================================
    // Artifact Configuration
    // =========================================================================
    /// Directory artifacts are written to. Created if missing.
    #[arg(long, default_value = DEFAULT_STATIC_DIR, env = "RESIZE_STATIC_DIR")]
    pub static_dir: PathBuf,

    /// URL path the artifact directory is served under.
    #[arg(long, default_value = DEFAULT_STATIC_URL_PREFIX, env = "RESIZE_STATIC_URL_PREFIX")]
    pub static_url_prefix: String,

    /// Resize artifacts to keep.
    #[arg(long, default_value_t = 1, env = "RESIZE_KEEP_RESIZE")]
    pub keep_resize: usize,

    /// Converted artifacts to keep.
    #[arg(long, default_value_t = 1, env = "RESIZE_KEEP_CONVERTED")]
    pub keep_converted: usize,

    /// Sharpen artifacts to keep.
    #[arg(long, default_value_t = 3, env = "RESIZE_KEEP_SHARPEN")]
    pub keep_sharpen: usize,

    /// Enhanced artifacts to keep.
    #[arg(long, default_value_t = 3, env = "RESIZE_KEEP_ENHANCED")]
    pub keep_enhanced: usize,

    // =========================================================================
    // Upload Configuration
    // =========================================================================
    /// Maximum upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "RESIZE_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Derive the content type from the file extension when the declared
    /// type is missing or not accepted.
    #[arg(long, default_value_t = false, env = "RESIZE_INFER_CONTENT_TYPE")]
    pub infer_content_type: bool,

    // =========================================================================
    // Encoding Configuration
    // =========================================================================
    /// Default quality for lossy encoders (1-100).
    #[arg(long, default_value_t = DEFAULT_QUALITY, env = "RESIZE_DEFAULT_QUALITY")]
    pub default_quality: u8,

    /// max-age of the cache hint returned with each artifact, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "RESIZE_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// stale-while-revalidate of the cache hint, in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_STALE_WHILE_REVALIDATE,
        env = "RESIZE_STALE_WHILE_REVALIDATE"
    )]
    pub stale_while_revalidate: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "RESIZE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
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
        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if !is_valid_quality(self.default_quality) {
            return Err("default_quality must be between 1 and 100".to_string());
        }

        for (name, keep) in [
            ("keep_resize", self.keep_resize),
            ("keep_converted", self.keep_converted),
            ("keep_sharpen", self.keep_sharpen),
            ("keep_enhanced", self.keep_enhanced),
        ] {
            if keep == 0 {
                return Err(format!("{} must be greater than 0", name));
            }
        }

        for (name, prefix) in [
            ("api_prefix", &self.api_prefix),
            ("static_url_prefix", &self.static_url_prefix),
        ] {
            if !prefix.starts_with('/') {
                return Err(format!("{} must start with '/'", name));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Cache hint string returned with each artifact.
    pub fn cache_control(&self) -> String {
        format!(
            "public, max-age={}, stale-while-revalidate={}",
            self.cache_max_age, self.stale_while_revalidate
        )
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            resize: self.keep_resize,
            converted: self.keep_converted,
            sharpen: self.keep_sharpen,
            enhanced: self.keep_enhanced,
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.max_upload_bytes).with_extension_inference(self.infer_content_type)
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.static_dir, &self.static_url_prefix)
    }

    /// Build the image service described by this configuration.
    pub fn image_service(&self) -> ImageService {
        ImageService::new(self.artifact_store(), self.upload_policy())
            .with_retention(self.retention())
            .with_cache_control(self.cache_control())
            .with_default_quality(self.default_quality)
    }

    pub fn router_config(&self) -> RouterConfig {
        let config = RouterConfig::new()
            .with_tracing(!self.no_tracing)
            .with_api_prefix(&self.api_prefix)
            .with_static_url_prefix(&self.static_url_prefix);

        match &self.cors_origins {
            Some(origins) => config.with_cors_origins(origins.clone()),
            None => config,
        }
    }
}

/// One-off prune configuration.
#[derive(Args, Debug, Clone)]
pub struct PruneConfig {
    /// Directory to prune.
    #[arg(long, default_value = DEFAULT_STATIC_DIR, env = "RESIZE_STATIC_DIR")]
    pub static_dir: PathBuf,

    /// File name prefix of the family to prune (e.g. resize, sharpen).
    #[arg(long)]
    pub prefix: String,

    /// Number of newest files to keep.
    #[arg(long, default_value_t = 1)]
    pub keep: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl PruneConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.prefix.trim().is_empty() {
            return Err("prefix must not be empty".to_string());
        }
        if self.keep == 0 {
            return Err("keep must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
