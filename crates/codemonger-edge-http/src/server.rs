//! Accept loop serving an [`EdgeHttpService`] over TCP.

use std::future::Future;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use codemonger_edge_core::ViewerRequestFunction;

use crate::origin::Origin;
use crate::service::EdgeHttpService;

/// Serve connections from `listener` until `shutdown` resolves, then drain
/// in-flight connections.
pub async fn serve<F, O>(
    listener: TcpListener,
    service: EdgeHttpService<F, O>,
    shutdown: impl Future<Output = ()>,
) where
    F: ViewerRequestFunction,
    O: Origin,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

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

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
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

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained");
}
