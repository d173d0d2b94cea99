// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics.

use crate::error::{AppError, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    /// Feed requests received, throttled or not
    pub requests: IntCounter,
    pub throttled: IntCounter,
    /// Per-source fetch or parse failures
    pub source_failures: IntCounterVec,
    pub fetch_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounter::new("feed_requests_total", "Feed requests received")?;
        let throttled = IntCounter::new(
            "feed_requests_throttled_total",
            "Feed requests rejected by the rate limiter",
        )?;
        let source_failures = IntCounterVec::new(
            Opts::new(
                "feed_source_failures_total",
                "Feed sources that could not be fetched or parsed",
            ),
            &["source"],
        )?;
        let fetch_duration = HistogramVec::new(
            HistogramOpts::new(
                "feed_fetch_duration_seconds",
                "Time spent fetching and parsing one source",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["source"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(throttled.clone()))?;
        registry.register(Box::new(source_failures.clone()))?;
        registry.register(Box::new(fetch_duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            throttled,
            source_failures,
            fetch_duration,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| AppError::Internal(e.to_string()))
    }
}
