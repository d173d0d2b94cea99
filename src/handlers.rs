// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the feed gateway.
//!
//! The feed endpoint answers GET only. Every response carries the security
//! headers; CORS follows the configured origin list.

use crate::assembler::ResponseAssembler;
use crate::classifier::HeuristicClassifier;
use crate::config::Config;
use crate::error::AppError;
use crate::fetcher::FeedFetcher;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::Metrics;
use crate::sanitizer::ContentSanitizer;
use crate::sources::FeedRegistry;
use crate::validator::UrlValidator;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

pub const FEEDS_PATH: &str = "/api/rss-feeds";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub fetcher: FeedFetcher,
    pub registry: FeedRegistry,
    pub assembler: Arc<ResponseAssembler>,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}

impl AppState {
    /// Wire every component from configuration.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let registry = FeedRegistry::new(config.feeds.clone())?;
        let validator = UrlValidator::new(&config.validation, &registry);
        let sanitizer = ContentSanitizer::new(config.content.sanitize_max_len);
        let classifier = HeuristicClassifier::new(
            sanitizer.clone(),
            config.content.classifier_snippet_len,
            config.classifier.clone(),
        );
        let assembler = Arc::new(ResponseAssembler::new(
            sanitizer,
            Arc::new(classifier),
            validator,
            config.validation.placeholder_images.clone(),
            config.content.clone(),
            config.fetch.max_items_per_feed,
            config.cache.clone(),
        ));
        let metrics = Arc::new(Metrics::new()?);
        let fetcher = FeedFetcher::new(config.fetch.clone(), assembler.clone(), metrics.clone())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            fetcher,
            registry,
            assembler,
            metrics,
            config,
        })
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "Error in feed handler");
        json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::to_vec(&ErrorResponse {
                error: "Service temporarily unavailable",
                retry_after: None,
            })
            .unwrap_or_default(),
        )
    }
}

/// Build the router with all layers.
pub fn router(state: Arc<AppState>) -> Router {
    // Explicit HEAD route, otherwise axum answers HEAD with the GET handler
    let feeds_route = get(feeds)
        .head(method_not_allowed)
        .options(preflight)
        .fallback(method_not_allowed);

    let mut app = Router::new()
        .route(FEEDS_PATH, feeds_route)
        .route("/health", get(health))
        .route("/healthz", get(health));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(cors_layer(&state.config))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400))
}

/// Attach the fixed security headers to every response.
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(JSON_CONTENT_TYPE));
    for (name, value) in [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::X_XSS_PROTECTION, "1; mode=block"),
        (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    ] {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

/// Aggregated feed endpoint.
pub async fn feeds(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let client = client_identifier(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    state.metrics.requests.inc();

    if let RateLimitResult::Limited { retry_after } = state.limiter.check(&client).await {
        let retry_secs = retry_after.as_secs();
        info!(client = %client, retry_after_secs = retry_secs, "Request rate limited");
        state.metrics.throttled.inc();
        let body = serde_json::to_vec(&ErrorResponse {
            error: "Too many requests",
            retry_after: Some(retry_secs),
        })
        .unwrap_or_default();
        let mut response = json_response(StatusCode::TOO_MANY_REQUESTS, body);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
        return response;
    }

    let mut response = match assemble(&state).await {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&state.assembler.cache_control()) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

async fn assemble(state: &AppState) -> Result<Vec<u8>, AppError> {
    let feeds = state.fetcher.fetch(&state.registry).await;
    let failed = feeds.iter().filter(|f| f.is_error()).count();
    if failed > 0 {
        warn!(failed, total = feeds.len(), "Some feeds unavailable");
    }
    let response = state.assembler.finish(feeds);
    debug!(last_updated = %response.last_updated, "Feed response assembled");
    Ok(serde_json::to_vec(&response)?)
}

/// Plain OPTIONS without CORS preflight headers.
async fn preflight() -> Response {
    json_response(StatusCode::OK, Vec::new())
}

async fn method_not_allowed() -> Response {
    let body = serde_json::to_vec(&serde_json::json!({ "error": "Method not allowed" }))
        .unwrap_or_default();
    let mut response = json_response(StatusCode::METHOD_NOT_ALLOWED, body);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, OPTIONS"));
    response
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "intel-feed-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let text = state.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// Client key for throttling: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the socket address.
pub fn client_identifier(headers: &HeaderMap, socket: Option<SocketAddr>) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    if let Some(first) = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header_str("x-real-ip").filter(|v| !v.is_empty()) {
        return real_ip.to_string();
    }

    socket
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}
