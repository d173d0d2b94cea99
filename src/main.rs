// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Intel Feed Gateway Service
//!
//! Serves `GET /api/rss-feeds`: every configured feed fetched in parallel,
//! sanitized, classified and URL-checked, as one JSON document.
//!
//! ## Configuration
//!
//! Defaults are built in. `CONFIG_FILE` may name a JSON file with any subset
//! of fields, and these environment variables override it:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `ALLOWED_ORIGINS`: Comma-separated CORS origins (default: *)
//! - `RATE_LIMIT_MAX_REQUESTS`: Requests per window per client (default: 30)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 60)
//! - `RATE_LIMIT_MAX_CLIENTS`: Tracked client cap (default: 10000)
//! - `FETCH_TIMEOUT_SECS`: Per-source timeout (default: 10)
//! - `FETCH_MAX_REDIRECTS`: Redirect hops per fetch (default: 3)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use intel_feed_gateway::{config::Config, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load()?;
    info!(
        bind_addr = %config.bind_addr,
        feeds = config.feeds.len(),
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        fetch_timeout_ms = config.fetch.timeout_ms,
        "Starting feed gateway"
    );

    let state = Arc::new(handlers::AppState::from_config(config.clone())?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_every = config.rate_limit.window_duration().max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    let app = handlers::router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
