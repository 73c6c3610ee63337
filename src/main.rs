//! Resize Service - resize, convert and enhance images over HTTP.
//!
//! This binary starts the HTTP server, or prunes an artifact directory once.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resize_service::{
    artifact,
    config::{Cli, Command, PruneConfig, ServeConfig},
    server::create_router,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Prune(config) => run_prune(config),
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

    info!("Resize Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!(
        "  Static dir: {} (served at {})",
        config.static_dir.display(),
        config.static_url_prefix
    );
    info!("  API prefix: {}", config.api_prefix);
    info!("  Upload cap: {} bytes", config.max_upload_bytes);
    info!(
        "  Keep: resize={} converted={} sharpen={} enhanced={}",
        config.keep_resize, config.keep_converted, config.keep_sharpen, config.keep_enhanced
    );

    let service = config.image_service();
    if let Err(e) = service.store().ensure_dir() {
        error!(
            "Failed to create static directory {}: {}",
            config.static_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let router = create_router(service, config.router_config());
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -F file=@photo.jpg -F width=64 -F height=64 http://{}{}/bicubic/",
        addr, config.api_prefix
    );
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
        "resize_service=debug,tower_http=debug"
    } else {
        "resize_service=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Prune Command
// =============================================================================

fn run_prune(config: PruneConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let report = artifact::prune(&config.static_dir, &config.prefix, config.keep, None);

    println!(
        "Pruned {}_* in {}",
        config.prefix,
        config.static_dir.display()
    );
    for path in &report.kept {
        println!("  kept     {}", path.display());
    }
    for path in &report.deleted {
        println!("  deleted  {}", path.display());
    }
    for path in &report.failed {
        println!("  FAILED   {}", path.display());
    }

    if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
