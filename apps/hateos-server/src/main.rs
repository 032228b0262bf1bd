//! Hateos Server - hypermedia REST server.
//!
//! Serves an in-memory `notes` resource through the hypermedia router,
//! answering every resource with `_links` describing what can be done next.
//!
//! # Usage
//!
//! ```text
//! HATEOS_LISTEN=0.0.0.0:8080 hateos-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HATEOS_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `HATEOS_BASE_PATH` | `/api` | Path every resource URL starts with |
//! | `HATEOS_MEDIA_TYPE` | `json` | `json` or `xml` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod notes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hateos_core::{HateosConfig, HateosRouters};
use hateos_http::{HateosHttpConfig, HateosHttpService};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::notes::NoteStore;

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

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: HateosHttpService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = HateosConfig::from_env();
    init_tracing(&config.log_level)?;

    let media_type = config.media_type()?;
    let store = Arc::new(NoteStore::default());
    let router = notes::router(&config.base_path, media_type, &store)?;
    let service = HateosHttpService::new(
        HateosRouters::new(vec![router]),
        HateosHttpConfig::default(),
    );

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        base_path = %config.base_path,
        %media_type,
        version = VERSION,
        "starting Hateos Server",
    );

    serve(listener, service).await
}
