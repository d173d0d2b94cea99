// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Feed items as received and articles as served.

use crate::sources::FeedSource;
use serde::{Deserialize, Serialize};

/// Message reported for a source that could not be fetched or parsed.
pub const FEED_UNAVAILABLE: &str = "Feed temporarily unavailable";

/// One upstream item. Every field is untrusted and optional.
///
/// Image candidates are kept as separate fields so the assembler can try
/// them in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    /// `content:encoded` (RSS) or `<content>` (Atom)
    pub content_encoded: Option<String>,
    /// `<description>` (RSS) or `<summary>` (Atom)
    pub description: Option<String>,
    /// `media:content@url`, falling back to `media:thumbnail@url`
    pub media_content: Option<String>,
    pub enclosure: Option<String>,
    pub itunes_image: Option<String>,
}

impl RawFeedItem {
    /// The richest body the item carries.
    pub fn body(&self) -> Option<&str> {
        self.content_encoded
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.description.as_deref())
    }
}

/// Heuristic risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Risk {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub cve: String,
    pub country: String,
    pub company: String,
    pub malware: String,
    pub risk: Risk,
    pub affected: String,
    pub attack_vector: String,
}

/// A sanitized, validated article ready for the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u32,
    pub title: String,
    pub short_title: String,
    pub source: String,
    pub content: String,
    /// Validated image URL or a placeholder
    pub image: String,
    /// Validated link or empty
    pub link: String,
    pub pub_date: String,
    pub metadata: Metadata,
}

/// Per-source section of the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResult {
    pub id: u32,
    pub name: String,
    pub source: String,
    pub color: String,
    pub count: usize,
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedResult {
    pub fn with_articles(source: &FeedSource, articles: Vec<Article>) -> Self {
        Self {
            id: source.id,
            name: source.name.clone(),
            source: source.source.clone(),
            color: source.color.clone(),
            count: articles.len(),
            articles,
            error: None,
        }
    }

    /// Result for a source whose fetch or parse failed.
    pub fn unavailable(source: &FeedSource) -> Self {
        Self {
            error: Some(FEED_UNAVAILABLE.to_string()),
            ..Self::with_articles(source, Vec::new())
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Body of a successful feed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedsResponse {
    pub feeds: Vec<FeedResult>,
    pub last_updated: String,
}
