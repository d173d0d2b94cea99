// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! SSRF-safe URL validation.
//!
//! Every URL taken from a feed passes through here before it is served or
//! requested again:
//! - Image URLs: https only, no local or private hosts, and an image path,
//!   a trusted image host, or a feed-associated host
//! - Link URLs: http or https, no local or private hosts
//!
//! Anything that fails to parse is rejected.

use crate::config::ValidationConfig;
use crate::sources::FeedRegistry;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Scheme {scheme} not allowed")]
    DisallowedScheme { scheme: String },

    #[error("URL has no host")]
    MissingHost,

    #[error("Local or private host blocked: {host}")]
    PrivateHost { host: String },

    #[error("Host {host} is not a known image source")]
    UntrustedImageHost { host: String },
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// URL is acceptable
    Valid,
    /// URL is rejected
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

#[derive(Debug)]
struct Rules {
    trusted_image_domains: Vec<String>,
    feed_domains: Vec<String>,
    image_extensions: Vec<String>,
}

/// Image and link URL validator. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    rules: Arc<Rules>,
}

impl UrlValidator {
    /// Create a validator; feed domains come from the registry plus config.
    pub fn new(config: &ValidationConfig, registry: &FeedRegistry) -> Self {
        let mut feed_domains = registry.domains();
        for domain in &config.extra_feed_domains {
            let domain = domain.to_lowercase();
            if !feed_domains.contains(&domain) {
                feed_domains.push(domain);
            }
        }

        Self {
            rules: Arc::new(Rules {
                trusted_image_domains: lowercase_all(&config.trusted_image_domains),
                feed_domains,
                image_extensions: config
                    .image_extensions
                    .iter()
                    .map(|ext| format!(".{}", ext.trim_start_matches('.').to_lowercase()))
                    .collect(),
            }),
        }
    }

    pub fn is_valid_image_url(&self, raw: &str) -> bool {
        self.validate_image_url(raw).is_valid()
    }

    pub fn is_valid_link_url(&self, raw: &str) -> bool {
        self.validate_link_url(raw).is_valid()
    }

    /// Validate a URL that will be served as an image source.
    pub fn validate_image_url(&self, raw: &str) -> ValidationResult {
        let url = match parse_public(raw, &["https"]) {
            Ok(url) => url,
            Err(err) => {
                debug!(url = %raw, error = %err, "Image URL rejected");
                return ValidationResult::Invalid(err);
            }
        };

        let path = url.path().to_lowercase();
        if self.rules.image_extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            return ValidationResult::Valid;
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.trim_end_matches('.').to_lowercase(),
            _ => String::new(),
        };
        if domain_matches(&host, &self.rules.trusted_image_domains)
            || domain_matches(&host, &self.rules.feed_domains)
        {
            return ValidationResult::Valid;
        }

        debug!(url = %raw, host = %host, "Image URL from untrusted host");
        ValidationResult::Invalid(ValidationError::UntrustedImageHost { host })
    }

    /// Validate a URL that will be served as an article link.
    pub fn validate_link_url(&self, raw: &str) -> ValidationResult {
        match parse_public(raw, &["http", "https"]) {
            Ok(_) => ValidationResult::Valid,
            Err(err) => {
                debug!(url = %raw, error = %err, "Link URL rejected");
                ValidationResult::Invalid(err)
            }
        }
    }
}

/// Parse `raw`, require one of `schemes`, and refuse local or private hosts.
fn parse_public(raw: &str, schemes: &[&str]) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ValidationError::DisallowedScheme {
            scheme: url.scheme().to_string(),
        });
    }
    check_public_host(&url)?;
    Ok(url)
}

/// Refuse hosts that resolve inside the local network by name or literal.
pub fn check_public_host(url: &Url) -> Result<(), ValidationError> {
    let blocked = match url.host() {
        None => return Err(ValidationError::MissingHost),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            domain.is_empty() || domain == "localhost" || domain.ends_with(".local")
        }
        Some(Host::Ipv4(ip)) => is_private_v4(ip),
        Some(Host::Ipv6(ip)) => is_private_v6(ip),
    };

    if blocked {
        let host = url.host_str().unwrap_or_default().to_string();
        return Err(ValidationError::PrivateHost { host });
    }
    Ok(())
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local() || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00 // unique local
        || (first & 0xffc0) == 0xfe80 // link local
}

fn domain_matches(host: &str, domains: &[String]) -> bool {
    !host.is_empty()
        && domains
            .iter()
            .any(|d| host == d || host.strip_suffix(d.as_str()).is_some_and(|p| p.ends_with('.')))
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
