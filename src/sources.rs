// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Registered feed sources.
//!
//! The registry is built once at start-up and shared read-only between
//! requests and fetch tasks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// A configured external RSS/Atom endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: u32,
    pub name: String,
    /// Short label shown next to each article
    pub source: String,
    pub url: String,
    pub color: String,
}

/// Registry construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate feed id {0}")]
    DuplicateId(u32),

    #[error("Invalid feed URL for {name}: {url}")]
    InvalidUrl { name: String, url: String },
}

/// Immutable, ordered set of feed sources.
#[derive(Debug, Clone)]
pub struct FeedRegistry {
    sources: Arc<[FeedSource]>,
}

impl FeedRegistry {
    /// Build a registry, rejecting duplicate ids and unparseable URLs.
    pub fn new(sources: Vec<FeedSource>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.id) {
                return Err(RegistryError::DuplicateId(source.id));
            }
            let parsed = Url::parse(&source.url).ok();
            if !parsed.is_some_and(|u| matches!(u.scheme(), "http" | "https")) {
                return Err(RegistryError::InvalidUrl {
                    name: source.name.clone(),
                    url: source.url.clone(),
                });
            }
        }
        Ok(Self {
            sources: sources.into(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Registrable domains of every source URL, deduplicated, in order.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        for source in self.sources.iter() {
            let Some(host) = Url::parse(&source.url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
            else {
                continue;
            };
            let domain = registrable_domain(&host);
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }
}

/// The sources the gateway ships with.
pub fn default_sources() -> Vec<FeedSource> {
    let source = |id, name: &str, label: &str, url: &str, color: &str| FeedSource {
        id,
        name: name.to_string(),
        source: label.to_string(),
        url: url.to_string(),
        color: color.to_string(),
    };
    vec![
        source(
            1,
            "US-CERT Alerts",
            "cisa.gov/rss",
            "https://www.cisa.gov/cybersecurity-advisories/all.xml",
            "cyan",
        ),
        source(
            2,
            "The Hacker News",
            "thehackernews.com",
            "https://feeds.feedburner.com/TheHackersNews",
            "blue",
        ),
        source(
            3,
            "Krebs on Security",
            "krebsonsecurity.com",
            "https://krebsonsecurity.com/feed/",
            "green",
        ),
        source(
            4,
            "Bleeping Computer",
            "bleepingcomputer.com",
            "https://www.bleepingcomputer.com/feed/",
            "purple",
        ),
        source(
            5,
            "SANS ISC",
            "isc.sans.edu",
            "https://isc.sans.edu/rssfeed.xml",
            "orange",
        ),
    ]
}

/// Registrable domain of a hostname. Knows a handful of two-part TLDs,
/// not the full Public Suffix List.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() <= 2 {
        return host;
    }

    let last_two = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
    if is_two_part_tld(&last_two) {
        format!("{}.{}", parts[parts.len() - 3], last_two)
    } else {
        last_two
    }
}

fn is_two_part_tld(suffix: &str) -> bool {
    const TWO_PART_TLDS: &[&str] = &[
        "co.uk", "org.uk", "me.uk", "gov.uk", "ac.uk", "co.nz", "co.jp", "co.kr", "com.au",
        "net.au", "org.au", "com.br", "co.za",
    ];
    TWO_PART_TLDS.contains(&suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_domains() {
        let registry = FeedRegistry::new(default_sources()).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.domains(),
            vec![
                "cisa.gov",
                "feedburner.com",
                "krebsonsecurity.com",
                "bleepingcomputer.com",
                "sans.edu"
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut sources = default_sources();
        sources[1].id = 1;
        assert_eq!(
            FeedRegistry::new(sources).unwrap_err(),
            RegistryError::DuplicateId(1)
        );
    }

    #[test]
    fn test_non_http_feed_rejected() {
        let mut sources = default_sources();
        sources[0].url = "file:///etc/passwd".to_string();
        assert!(matches!(
            FeedRegistry::new(sources),
            Err(RegistryError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("www.example.com"), "example.com");
        assert_eq!(registrable_domain("isc.sans.edu"), "sans.edu");
        assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("10.0.0.1"), "10.0.0.1");
    }
}
