// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the feed gateway.
//!
//! Every field has a serde default, so a partial JSON file (or none at all)
//! yields a working service. Environment variables override individual
//! fields after the file is read.

use crate::sources::FeedSource;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the feed gateway service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed by CORS; `*` allows any (default: ["*"])
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Upstream fetch configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// URL validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Sanitizer and article field limits
    #[serde(default)]
    pub content: ContentConfig,

    /// Fixed metadata values the classifier does not extract
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Response caching hints
    #[serde(default)]
    pub cache: CacheConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Registered feed sources, in response order
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSource>,
}

/// Sliding-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client (default: 30)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Hard cap on tracked client identifiers (default: 10000)
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,

    /// Identifiers are truncated to this many characters (default: 100)
    #[serde(default = "default_max_identifier_len")]
    pub max_identifier_len: usize,

    /// Retry hint sent with 429 responses, in seconds (default: 60)
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
}

/// Upstream feed fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-source timeout in milliseconds (default: 10000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Redirect hops followed per request (default: 3)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Largest accepted feed document in bytes (default: 5 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Articles kept per source; never more than 5 (default: 5)
    #[serde(default = "default_max_items_per_feed")]
    pub max_items_per_feed: usize,

    /// User-Agent sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// URL validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Image hosts accepted regardless of path (exact or subdomain match)
    #[serde(default = "default_trusted_image_domains")]
    pub trusted_image_domains: Vec<String>,

    /// Feed-associated domains in addition to those derived from the registry
    #[serde(default = "default_extra_feed_domains")]
    pub extra_feed_domains: Vec<String>,

    /// Path extensions that mark a URL as an image
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Fallback images, picked deterministically per article
    #[serde(default = "default_placeholder_images")]
    pub placeholder_images: Vec<String>,
}

/// Sanitizer and article field limits, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Hard cap applied as the last sanitizer step (default: 2000)
    #[serde(default = "default_sanitize_max_len")]
    pub sanitize_max_len: usize,

    #[serde(default = "default_title_max_len")]
    pub title_max_len: usize,

    #[serde(default = "default_short_title_max_len")]
    pub short_title_max_len: usize,

    #[serde(default = "default_content_max_len")]
    pub content_max_len: usize,

    /// Leading content characters the classifier inspects (default: 500)
    #[serde(default = "default_snippet_len")]
    pub classifier_snippet_len: usize,
}

/// Metadata fields with no extraction logic behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_company")]
    pub company: String,

    #[serde(default = "default_affected")]
    pub affected: String,

    #[serde(default = "default_attack_vector")]
    pub attack_vector: String,
}

/// Shared-cache hints for successful feed responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_s_maxage")]
    pub s_maxage_secs: u64,

    #[serde(default = "default_stale_while_revalidate")]
    pub stale_while_revalidate_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_requests() -> u32 {
    30
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_clients() -> usize {
    10_000
}

fn default_max_identifier_len() -> usize {
    100
}

fn default_retry_after_secs() -> u64 {
    60
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_redirects() -> usize {
    3
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_items_per_feed() -> usize {
    5
}

fn default_user_agent() -> String {
    concat!("intel-feed-gateway/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_trusted_image_domains() -> Vec<String> {
    [
        "images.unsplash.com",
        "unsplash.com",
        "i.imgur.com",
        "media.cnn.com",
        "cdn.mos.cms.futurecdn.net",
        "krebsonsecurity.com",
        "www.bleepstatic.com",
        "thehackernews.com",
        "feeds.feedburner.com",
        "isc.sans.edu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_extra_feed_domains() -> Vec<String> {
    // The Hacker News is served through feedburner
    vec!["thehackernews.com".to_string()]
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "avif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_placeholder_images() -> Vec<String> {
    [
        "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?w=400&h=300&fit=crop",
        "https://images.unsplash.com/photo-1563986768609-322da13575f3?w=400&h=300&fit=crop",
        "https://images.unsplash.com/photo-1504639725590-34d0984388bd?w=400&h=300&fit=crop",
        "https://images.unsplash.com/photo-1526374965328-7f61d4dc18c5?w=400&h=300&fit=crop",
        "https://images.unsplash.com/photo-1558494949-ef010cbdcc31?w=400&h=300&fit=crop",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_sanitize_max_len() -> usize {
    2000
}

fn default_title_max_len() -> usize {
    200
}

fn default_short_title_max_len() -> usize {
    40
}

fn default_content_max_len() -> usize {
    1000
}

fn default_snippet_len() -> usize {
    500
}

fn default_country() -> String {
    "Global".to_string()
}

fn default_company() -> String {
    "Multiple".to_string()
}

fn default_affected() -> String {
    "Various Systems".to_string()
}

fn default_attack_vector() -> String {
    "Multiple Vectors".to_string()
}

fn default_s_maxage() -> u64 {
    300
}

fn default_stale_while_revalidate() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_feeds() -> Vec<FeedSource> {
    crate::sources::default_sources()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            rate_limit: RateLimitConfig::default(),
            fetch: FetchConfig::default(),
            validation: ValidationConfig::default(),
            content: ContentConfig::default(),
            classifier: ClassifierConfig::default(),
            cache: CacheConfig::default(),
            metrics: MetricsConfig::default(),
            feeds: default_feeds(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            max_clients: default_max_clients(),
            max_identifier_len: default_max_identifier_len(),
            retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            max_items_per_feed: default_max_items_per_feed(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            trusted_image_domains: default_trusted_image_domains(),
            extra_feed_domains: default_extra_feed_domains(),
            image_extensions: default_image_extensions(),
            placeholder_images: default_placeholder_images(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            sanitize_max_len: default_sanitize_max_len(),
            title_max_len: default_title_max_len(),
            short_title_max_len: default_short_title_max_len(),
            content_max_len: default_content_max_len(),
            classifier_snippet_len: default_snippet_len(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            company: default_company(),
            affected: default_affected(),
            attack_vector: default_attack_vector(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            s_maxage_secs: default_s_maxage(),
            stale_while_revalidate_secs: default_stale_while_revalidate(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }
}

impl FetchConfig {
    /// Get the per-source timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CacheConfig {
    /// Render the `Cache-Control` value for successful responses.
    pub fn header_value(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.s_maxage_secs, self.stale_while_revalidate_secs
        )
    }
}

impl Config {
    /// Load configuration: optional JSON file named by `CONFIG_FILE`,
    /// then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would disable throttling.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.rate_limit.window_secs > 0,
            "rate_limit.window_secs must be at least 1"
        );
        Ok(())
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !origins.is_empty() {
                self.allowed_origins = origins;
            }
        }
        if let Some(v) = parsed(lookup("RATE_LIMIT_MAX_REQUESTS")) {
            self.rate_limit.max_requests = v;
        }
        // A zero window never denies anything
        if let Some(v) = parsed::<u64>(lookup("RATE_LIMIT_WINDOW_SECS")).filter(|v| *v > 0) {
            self.rate_limit.window_secs = v;
        }
        if let Some(v) = parsed(lookup("RATE_LIMIT_MAX_CLIENTS")) {
            self.rate_limit.max_clients = v;
        }
        if let Some(v) = parsed::<u64>(lookup("FETCH_TIMEOUT_SECS")) {
            self.fetch.timeout_ms = v.saturating_mul(1000);
        }
        if let Some(v) = parsed(lookup("FETCH_MAX_REDIRECTS")) {
            self.fetch.max_redirects = v;
        }
    }

    /// Whether any origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.rate_limit.max_requests, 30);
        assert_eq!(config.rate_limit.window_duration(), Duration::from_secs(60));
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(config.fetch.max_redirects, 3);
        assert_eq!(config.feeds.len(), 5);
        assert!(config.allows_any_origin());
        assert_eq!(
            config.cache.header_value(),
            "public, s-maxage=300, stale-while-revalidate=60"
        );
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"rate_limit": {"max_requests": 5}}"#).unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.classifier.country, "Global");
        assert_eq!(config.validation.placeholder_images.len(), 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("RATE_LIMIT_MAX_REQUESTS", "12"),
            ("FETCH_TIMEOUT_SECS", "3"),
            ("FETCH_MAX_REDIRECTS", "not-a-number"),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.allows_any_origin());
        assert_eq!(config.rate_limit.max_requests, 12);
        assert_eq!(config.fetch.timeout_ms, 3000);
        assert_eq!(config.fetch.max_redirects, 3);
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "RATE_LIMIT_WINDOW_SECS").then(|| "0".to_string()));
        assert_eq!(config.rate_limit.window_secs, 60);
        assert!(config.validate().is_ok());

        let config: Config =
            serde_json::from_str(r#"{"rate_limit": {"window_secs": 0}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
