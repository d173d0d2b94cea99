// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Flood patterns against the per-client rate limiter.

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Number of distinct client identifiers to rotate through
    pub unique_clients: usize,
    /// Characters of padding prepended to every identifier
    pub identifier_padding: usize,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 1,
            identifier_padding: 0,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client hammering the endpoint.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 200,
            unique_clients: 1,
            ..Default::default()
        }
    }

    /// Many clients, each staying under the cap.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            unique_clients: 100,
            ..Default::default()
        }
    }

    /// Spoofed forwarding headers with a fresh identifier per request.
    pub fn identifier_rotation() -> Self {
        Self {
            total_requests: 5_000,
            unique_clients: 5_000,
            ..Default::default()
        }
    }

    /// Identifiers that differ only past the length cap.
    pub fn oversized_identifiers() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 100,
            identifier_padding: 10_000,
        }
    }

    /// Identifier used for request `index`.
    pub fn identifier(&self, index: usize, pool: &[String]) -> String {
        let base = &pool[index % pool.len()];
        if self.identifier_padding == 0 {
            base.clone()
        } else {
            format!("{}{}", "a".repeat(self.identifier_padding), base)
        }
    }
}
