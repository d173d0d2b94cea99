// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the feed gateway.

use std::time::Duration;
use thiserror::Error;

/// Why a single source produced no articles.
///
/// These never reach the client; the source is reported as unavailable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("feed document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("feed parsing error: {0}")]
    Parse(String),

    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Top-level failures, answered with a generic 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("registry error: {0}")]
    Registry(#[from] crate::sources::RegistryError),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
