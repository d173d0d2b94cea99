// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Builds articles from raw feed items and stamps the final response.

use crate::classifier::Classifier;
use crate::config::{CacheConfig, ContentConfig};
use crate::models::{Article, FeedResult, FeedsResponse, RawFeedItem};
use crate::sanitizer::{truncate_chars, ContentSanitizer};
use crate::sources::FeedSource;
use crate::validator::UrlValidator;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Hard ceiling on articles per source; keeps `id = source * 100 + n` unique.
pub const MAX_ARTICLES_PER_SOURCE: usize = 5;

const UNTITLED: &str = "Untitled";
const PUB_DATE_MAX_LEN: usize = 64;

static INLINE_IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap());

pub struct ResponseAssembler {
    sanitizer: ContentSanitizer,
    classifier: Arc<dyn Classifier>,
    validator: UrlValidator,
    placeholders: Vec<String>,
    limits: ContentConfig,
    max_items: usize,
    cache: CacheConfig,
}

impl ResponseAssembler {
    pub fn new(
        sanitizer: ContentSanitizer,
        classifier: Arc<dyn Classifier>,
        validator: UrlValidator,
        placeholders: Vec<String>,
        limits: ContentConfig,
        max_items: usize,
        cache: CacheConfig,
    ) -> Self {
        Self {
            sanitizer,
            classifier,
            validator,
            placeholders,
            limits,
            max_items: max_items.min(MAX_ARTICLES_PER_SOURCE),
            cache,
        }
    }

    /// Turn up to five items of one source into its result section.
    pub fn build_feed(&self, source: &FeedSource, items: Vec<RawFeedItem>) -> FeedResult {
        let articles = items
            .iter()
            .take(self.max_items)
            .enumerate()
            .map(|(index, item)| self.build_article(source, index, item))
            .collect();
        FeedResult::with_articles(source, articles)
    }

    pub fn build_article(&self, source: &FeedSource, index: usize, item: &RawFeedItem) -> Article {
        let title = self
            .sanitizer
            .sanitize(item.title.as_deref().unwrap_or(UNTITLED));
        let content = self.sanitizer.sanitize_opt(item.body());

        let link = item
            .link
            .as_deref()
            .filter(|link| self.validator.is_valid_link_url(link))
            .unwrap_or_default()
            .to_string();

        let pub_date = match item.pub_date.as_deref().map(|d| self.sanitizer.sanitize(d)) {
            Some(date) if !date.trim().is_empty() => truncate_chars(&date, PUB_DATE_MAX_LEN),
            _ => now_rfc3339(),
        };

        Article {
            id: source.id * 100 + index as u32 + 1,
            short_title: truncate_chars(&title, self.limits.short_title_max_len),
            title: truncate_chars(&title, self.limits.title_max_len),
            source: source.source.clone(),
            content: truncate_chars(&content, self.limits.content_max_len),
            image: self.select_image(source, index, item),
            link,
            pub_date,
            metadata: self.classifier.classify(item),
        }
    }

    /// First candidate that validates, else the deterministic placeholder.
    pub fn select_image(&self, source: &FeedSource, index: usize, item: &RawFeedItem) -> String {
        let inline = item
            .body()
            .and_then(|html| INLINE_IMAGE_PATTERN.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());

        let candidates = [
            item.media_content.as_deref(),
            item.enclosure.as_deref(),
            item.itunes_image.as_deref(),
            inline,
        ];

        if let Some(url) = candidates
            .into_iter()
            .flatten()
            .find(|url| self.validator.is_valid_image_url(url))
        {
            return url.to_string();
        }

        debug!(source = %source.name, index, "No valid image candidate, using placeholder");
        self.placeholder(source.id, index)
    }

    /// Placeholder at `(source_id * 5 + index) % count`.
    pub fn placeholder(&self, source_id: u32, index: usize) -> String {
        if self.placeholders.is_empty() {
            return String::new();
        }
        let slot = (source_id as usize * 5 + index) % self.placeholders.len();
        self.placeholders[slot].clone()
    }

    /// Stamp the assembly time onto the collected feed results.
    pub fn finish(&self, feeds: Vec<FeedResult>) -> FeedsResponse {
        FeedsResponse {
            feeds,
            last_updated: now_rfc3339(),
        }
    }

    /// `Cache-Control` value for successful responses.
    pub fn cache_control(&self) -> String {
        self.cache.header_value()
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
