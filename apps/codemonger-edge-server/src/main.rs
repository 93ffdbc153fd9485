//! Codemonger Edge Server - serves the site contents locally with the
//! distribution's viewer-request function applied.
//!
//! Directory-style URIs (`/blog/post001`, `/blog/post001/`) are expanded to
//! their `index.html` before the contents directory is consulted, the same way
//! the production distribution rewrites requests in front of the contents
//! bucket.
//!
//! # Usage
//!
//! ```text
//! CONTENTS_DIR=./docs GATEWAY_LISTEN=127.0.0.1:3000 codemonger-edge-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:3000` | Bind address |
//! | `CONTENTS_DIR` | `./docs` | Directory served as the origin |
//! | `DEPLOYMENT_STAGE` | `development` | `development` (1 s TTL) or `production` (10 min TTL) |
//! | `CACHE_TTL_SECONDS` | *(stage default)* | Overrides the stage cache TTL |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use codemonger_edge_core::{EdgeConfig, ExpandIndex, ViewerRequestFunction};
use codemonger_edge_http::{DirectoryOrigin, EdgeHttpConfig, EdgeHttpService, serve};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the edge service from the application [`EdgeConfig`].
fn build_service(config: &EdgeConfig) -> EdgeHttpService<ExpandIndex, DirectoryOrigin> {
    EdgeHttpService::new(
        ExpandIndex,
        DirectoryOrigin::new(&config.contents_dir),
        EdgeHttpConfig::from(config),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EdgeConfig::from_env().context("failed to load configuration")?;

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        contents_dir = %config.contents_dir,
        deployment_stage = %config.deployment_stage,
        cache_ttl_secs = config.cache_ttl().as_secs(),
        version = VERSION,
        "starting Codemonger Edge Server",
    );

    if !Path::new(&config.contents_dir).is_dir() {
        warn!(
            contents_dir = %config.contents_dir,
            "contents directory does not exist, every object request will be NoSuchKey"
        );
    }

    let service = build_service(&config);
    info!(function = service.function().name(), "viewer-request function attached");

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    serve(listener, service, shutdown).await;
    info!("exiting");

    Ok(())
}
