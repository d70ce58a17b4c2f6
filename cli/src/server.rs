// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway HTTP server
//!
//! Every request except the gateway's own health probe goes through the
//! protection layer before being relayed upstream.

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use datadome_protection::Client;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use url::Url;

use crate::proxy::{forward, ProxyState};

/// Path answered by the gateway itself, never protected nor forwarded.
pub const HEALTH_PATH: &str = "/_ddgate/health";

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub upstream: Url,
    pub upstream_timeout: Duration,
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router(client: Client, proxy: ProxyState) -> Router {
    Router::new()
        .fallback(forward)
        .with_state(proxy)
        .layer(client.layer())
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(client: Client, options: ServeOptions) -> Result<()> {
    let proxy = ProxyState::new(options.upstream.clone(), options.upstream_timeout)
        .context("Failed to initialize upstream client")?;
    let app = router(client, proxy);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("ddgate listening on {}, forwarding to {}", addr, options.upstream);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    info!("ddgate shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
