//! Serve command handler.
//!
//! Loads the models once, serves the HTTP API and releases the chat model
//! after a graceful shutdown.

use crate::http::{router, AppState};
use anyhow::Context;
use assist_core::config::AppConfig;
use assist_knowledge::Assistant;
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;

/// Run the HTTP server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (host:port)
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let addr: SocketAddr = config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {}", config.server.bind))?;

        let assistant = Arc::new(
            Assistant::from_config(config)
                .await
                .context("failed to initialize the answering pipeline")?,
        );

        let app = router(AppState::new(Arc::clone(&assistant)));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        tracing::info!("Server stopped, releasing models");

        if let Err(e) = assistant.shutdown().await {
            tracing::warn!("Failed to release chat model: {}", e);
        }

        Ok(())
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
