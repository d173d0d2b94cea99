// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Intel Feed Gateway
//!
//! Aggregates a fixed set of security-news RSS/Atom feeds into one JSON
//! document for a display layer that performs no validation of its own:
//!
//! - Per-client sliding-window rate limiting (30 requests per 60 s)
//! - Concurrent per-source fetch with isolated failures and timeouts
//! - Untrusted text sanitization
//! - Heuristic CVE / risk / malware classification
//! - SSRF-safe validation of every image and link URL

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod sanitizer;
pub mod sources;
pub mod validator;

pub use assembler::ResponseAssembler;
pub use classifier::{Classifier, HeuristicClassifier};
pub use config::Config;
pub use error::{AppError, FetchError};
pub use fetcher::FeedFetcher;
pub use limiter::{RateLimitResult, RateLimiter};
pub use models::{Article, FeedResult, FeedsResponse, Metadata, RawFeedItem, Risk};
pub use sanitizer::ContentSanitizer;
pub use sources::{FeedRegistry, FeedSource};
pub use validator::{UrlValidator, ValidationResult};
