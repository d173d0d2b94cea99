// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Concurrent feed retrieval.
//!
//! Each source gets its own task and its own timeout. A source that fails
//! in any way becomes an "unavailable" result; the others are unaffected.
//! Tasks are detached from the caller, so they run to completion (or
//! timeout) even if the requesting client goes away.

use crate::assembler::ResponseAssembler;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::metrics::Metrics;
use crate::models::{FeedResult, RawFeedItem};
use crate::sources::{FeedRegistry, FeedSource};
use crate::validator::{check_public_host, ValidationError};
use reqwest::{redirect, Client};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use url::Url;
use tracing::{debug, error, warn};

/// Fetches every registered source in parallel and assembles the results.
#[derive(Clone)]
pub struct FeedFetcher {
    client: Client,
    config: FetchConfig,
    assembler: Arc<ResponseAssembler>,
    metrics: Arc<Metrics>,
}

impl FeedFetcher {
    pub fn new(
        config: FetchConfig,
        assembler: Arc<ResponseAssembler>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect_policy(config.max_redirects, check_public_host))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            config,
            assembler,
            metrics,
        })
    }

    /// One result per source, in registry order, once every task settles.
    pub async fn fetch(&self, registry: &FeedRegistry) -> Vec<FeedResult> {
        let handles: Vec<_> = registry
            .iter()
            .cloned()
            .map(|source| {
                let fetcher = self.clone();
                tokio::spawn(async move { fetcher.fetch_source(&source).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (source, handle) in registry.iter().zip(handles) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(err) => {
                    let err = FetchError::from(err);
                    error!(source = %source.name, error = %err, "Feed task aborted");
                    self.record_failure(source);
                    results.push(FeedResult::unavailable(source));
                }
            }
        }
        results
    }

    /// Fetch, parse and assemble one source. Never fails.
    pub async fn fetch_source(&self, source: &FeedSource) -> FeedResult {
        let started = Instant::now();
        let timeout = self.config.timeout();

        let outcome = match tokio::time::timeout(timeout, self.fetch_items(source)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(timeout)),
        };

        self.metrics
            .fetch_duration
            .with_label_values(&[source.name.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(items) => {
                debug!(source = %source.name, items = items.len(), "Feed fetched");
                self.assembler.build_feed(source, items)
            }
            Err(err) => {
                warn!(source = %source.name, url = %source.url, error = %err, "Error fetching feed");
                self.record_failure(source);
                FeedResult::unavailable(source)
            }
        }
    }

    /// Download and parse a source document.
    pub async fn fetch_items(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, FetchError> {
        let mut response = self.client.get(source.url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let limit = self.config.max_body_bytes;
        if let Some(size) = response.content_length() {
            if size as usize > limit {
                return Err(FetchError::TooLarge {
                    size: size as usize,
                    limit,
                });
            }
        }

        // Content-Length is absent on chunked responses; count as we read
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = body.len() + chunk.len();
            if size > limit {
                return Err(FetchError::TooLarge { size, limit });
            }
            body.extend_from_slice(&chunk);
        }

        parse_feed(&body)
    }

    fn record_failure(&self, source: &FeedSource) {
        self.metrics
            .source_failures
            .with_label_values(&[source.name.as_str()])
            .inc();
    }
}

/// Follow at most `max` redirects, and only to http(s) targets that `guard`
/// accepts.
fn redirect_policy<F>(max: usize, guard: F) -> redirect::Policy
where
    F: Fn(&Url) -> Result<(), ValidationError> + Send + Sync + 'static,
{
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max {
            return attempt.error(format!("more than {max} redirects"));
        }
        let url = attempt.url().clone();
        if !matches!(url.scheme(), "http" | "https") {
            return attempt.error(format!("redirect to {} scheme refused", url.scheme()));
        }
        match guard(&url) {
            Ok(()) => attempt.follow(),
            Err(err) => attempt.error(err),
        }
    })
}

/// Parse an RSS 2.0 or Atom document.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawFeedItem>, FetchError> {
    let rss_error = match rss::Channel::read_from(body) {
        Ok(channel) => return Ok(channel.items().iter().map(from_rss_item).collect()),
        Err(err) => err,
    };

    match atom_syndication::Feed::read_from(body) {
        Ok(feed) => Ok(feed.entries().iter().map(from_atom_entry).collect()),
        Err(atom_error) => Err(FetchError::Parse(format!(
            "not RSS ({rss_error}) or Atom ({atom_error})"
        ))),
    }
}

fn from_rss_item(item: &rss::Item) -> RawFeedItem {
    RawFeedItem {
        title: item.title().map(str::to_string),
        link: item.link().map(str::to_string),
        pub_date: item.pub_date().map(str::to_string),
        content_encoded: item.content().map(str::to_string),
        description: item.description().map(str::to_string),
        media_content: media_url(item.extensions().get("media").map(|m| {
            (
                attr_urls(m.get("content").map(|v| v.iter().map(|e| e.attrs()))),
                attr_urls(m.get("thumbnail").map(|v| v.iter().map(|e| e.attrs()))),
            )
        })),
        enclosure: item.enclosure().map(|e| e.url().to_string()),
        itunes_image: item
            .itunes_ext()
            .and_then(|ext| ext.image())
            .map(str::to_string),
    }
}

fn from_atom_entry(entry: &atom_syndication::Entry) -> RawFeedItem {
    let link = entry
        .links()
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| entry.links().first())
        .map(|l| l.href().to_string());

    let pub_date = entry
        .published()
        .unwrap_or_else(|| entry.updated())
        .to_rfc3339();

    let enclosure = entry
        .links()
        .iter()
        .find(|l| l.rel() == "enclosure")
        .map(|l| l.href().to_string());

    RawFeedItem {
        title: Some(entry.title().as_str().to_string()),
        link,
        pub_date: Some(pub_date),
        content_encoded: entry
            .content()
            .and_then(|c| c.value())
            .map(str::to_string),
        description: entry.summary().map(|s| s.as_str().to_string()),
        media_content: media_url(entry.extensions().get("media").map(|m| {
            (
                attr_urls(m.get("content").map(|v| v.iter().map(|e| e.attrs()))),
                attr_urls(m.get("thumbnail").map(|v| v.iter().map(|e| e.attrs()))),
            )
        })),
        enclosure,
        itunes_image: None,
    }
}

/// `url` attributes of a list of extension elements.
fn attr_urls<'a, I>(elements: Option<I>) -> Vec<String>
where
    I: Iterator<Item = &'a BTreeMap<String, String>>,
{
    elements
        .into_iter()
        .flatten()
        .filter_map(|attrs| attrs.get("url").cloned())
        .collect()
}

/// Prefer `media:content`, then `media:thumbnail`.
fn media_url(media: Option<(Vec<String>, Vec<String>)>) -> Option<String> {
    let (content, thumbnail) = media?;
    content.into_iter().chain(thumbnail).next()
}
