// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter keyed by client identifier.
//!
//! Each identifier keeps the timestamps of its allowed requests inside the
//! trailing window. The table is capped: when it grows past
//! `max_clients`, idle identifiers go first, then the least recently
//! active ones.

use crate::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until the oldest counted request leaves the window
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Fixed retry hint
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Thread-safe sliding-window rate limiter.
///
/// All reads and writes of one identifier's window happen under the
/// table's write lock, so concurrent checks cannot both take the last slot.
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check and record a request for `identifier`.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        self.check_at(identifier, Instant::now()).await
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub async fn check_at(&self, identifier: &str, now: Instant) -> RateLimitResult {
        let key = sanitize_identifier(identifier, self.config.max_identifier_len);
        let window = self.config.window_duration();
        let max = self.config.max_requests as usize;

        let mut clients = self.clients.write().await;
        let timestamps = clients.entry(key.clone()).or_default();
        expire(timestamps, now, window);

        if timestamps.len() >= max {
            debug!(client = %key, count = timestamps.len(), "Client rate limit exceeded");
            if timestamps.is_empty() {
                clients.remove(&key);
            }
            return RateLimitResult::Limited {
                retry_after: self.config.retry_after(),
            };
        }

        timestamps.push_back(now);
        let remaining = (max - timestamps.len()) as u32;
        let reset_in = timestamps
            .front()
            .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(window);

        if clients.len() > self.config.max_clients {
            evict(&mut clients, now, window, self.config.max_clients);
        }

        RateLimitResult::Allowed {
            remaining,
            reset_in,
        }
    }

    /// Drop identifiers with no requests inside the window.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window_duration();
        let mut clients = self.clients.write().await;
        clients.retain(|_, timestamps| {
            expire(timestamps, now, window);
            !timestamps.is_empty()
        });
    }

    /// Number of identifiers currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.clients.read().await.len()
    }
}

fn expire(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while timestamps
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) >= window)
    {
        timestamps.pop_front();
    }
}

/// Bring the table back to at most `cap` identifiers.
fn evict(
    clients: &mut HashMap<String, VecDeque<Instant>>,
    now: Instant,
    window: Duration,
    cap: usize,
) {
    let before = clients.len();
    clients.retain(|_, timestamps| {
        expire(timestamps, now, window);
        !timestamps.is_empty()
    });

    if clients.len() > cap {
        let mut by_activity: Vec<(Instant, String)> = clients
            .iter()
            .filter_map(|(key, ts)| ts.back().map(|last| (*last, key.clone())))
            .collect();
        by_activity.sort();
        let excess = clients.len() - cap;
        for (_, key) in by_activity.into_iter().take(excess) {
            clients.remove(&key);
        }
    }

    warn!(
        before,
        after = clients.len(),
        cap,
        "Rate limit table over capacity, evicted clients"
    );
}

/// Bound an identifier's length and restrict it to `[A-Za-z0-9_.:]`.
pub fn sanitize_identifier(identifier: &str, max_len: usize) -> String {
    identifier
        .chars()
        .take(max_len)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':'))
        .collect()
}
