//! Stdio transport for the MCP server.
//!
//! Serves the MCP service over stdin/stdout until the client disconnects or
//! SIGINT/SIGTERM arrives, then closes the connection pool.

use crate::error::{DbError, DbResult};
use crate::mcp::MySqlService;
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use tokio::signal;
use tracing::{info, warn};

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, using MCP JSON-RPC framing.
pub struct StdioTransport {
    service: MySqlService,
}

impl StdioTransport {
    pub fn new(service: MySqlService) -> Self {
        Self { service }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let provider = self.service.provider().clone();
        let running_service = self
            .service
            .clone()
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Client disconnected");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        provider.close().await;
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            // Spawn a task to listen for second signal and force exit
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        provider.close().await;

        if shutdown_requested {
            // stdin reads block; tokio::select! cannot interrupt them
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// A handler that cannot be installed never fires.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionSettings, PoolOptions};
    use crate::db::{ConnectionProvider, QueryExecutor};
    use std::sync::Arc;

    #[test]
    fn test_stdio_transport_creation() {
        let provider = Arc::new(ConnectionProvider::new(
            ConnectionSettings::new("127.0.0.1", 3306, "root", None, "app"),
            PoolOptions::default(),
        ));
        let service = MySqlService::new(provider, QueryExecutor::default(), false);
        let transport = StdioTransport::new(service);
        assert_eq!(transport.name(), "stdio");
    }
}
