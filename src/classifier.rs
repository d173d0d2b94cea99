// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Article metadata classification.
//!
//! [`HeuristicClassifier`] is a keyword heuristic with no ground truth
//! behind it. Callers depend on the [`Classifier`] trait only.

use crate::config::ClassifierConfig;
use crate::models::{Metadata, RawFeedItem, Risk};
use crate::sanitizer::{truncate_chars, ContentSanitizer};
use regex::Regex;
use std::sync::LazyLock;

const NOT_AVAILABLE: &str = "N/A";
const MALWARE_DETECTED: &str = "Detected";

static CVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,7}").unwrap());
static CRITICAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(critical|zero-day|exploit|breach|actively exploited)\b").unwrap()
});
static HIGH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(high severity|severe|ransomware|apt)\b").unwrap());
static LOW_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(low|minor)\b").unwrap());
static MALWARE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(malware|trojan|ransomware)\b").unwrap());

/// Derives [`Metadata`] from a feed item.
pub trait Classifier: Send + Sync {
    fn classify(&self, item: &RawFeedItem) -> Metadata;
}

/// Regex keyword classifier.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    sanitizer: ContentSanitizer,
    snippet_len: usize,
    constants: ClassifierConfig,
}

impl HeuristicClassifier {
    pub fn new(sanitizer: ContentSanitizer, snippet_len: usize, constants: ClassifierConfig) -> Self {
        Self {
            sanitizer,
            snippet_len,
            constants,
        }
    }
}

impl Classifier for HeuristicClassifier {
    fn classify(&self, item: &RawFeedItem) -> Metadata {
        let title = self
            .sanitizer
            .sanitize(item.title.as_deref().unwrap_or("Untitled"));
        let content = self.sanitizer.sanitize_opt(item.body());
        let snippet = truncate_chars(&content, self.snippet_len);

        Metadata {
            cve: extract_cve(&content)
                .or_else(|| extract_cve(&title))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            country: self.constants.country.clone(),
            company: self.constants.company.clone(),
            malware: if MALWARE_PATTERN.is_match(&snippet) {
                MALWARE_DETECTED.to_string()
            } else {
                NOT_AVAILABLE.to_string()
            },
            risk: assess_risk(&title, &snippet),
            affected: self.constants.affected.clone(),
            attack_vector: self.constants.attack_vector.clone(),
        }
    }
}

fn extract_cve(text: &str) -> Option<String> {
    CVE_PATTERN.find(text).map(|m| m.as_str().to_uppercase())
}

/// First matching tier wins; only the title can lower the risk.
fn assess_risk(title: &str, snippet: &str) -> Risk {
    let either = |pattern: &Regex| pattern.is_match(title) || pattern.is_match(snippet);

    if either(&CRITICAL_PATTERN) {
        Risk::Critical
    } else if either(&HIGH_PATTERN) {
        Risk::High
    } else if LOW_PATTERN.is_match(title) {
        Risk::Low
    } else {
        Risk::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> HeuristicClassifier {
        HeuristicClassifier::new(ContentSanitizer::new(2000), 500, ClassifierConfig::default())
    }

    fn titled(title: &str) -> RawFeedItem {
        RawFeedItem {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_critical_title() {
        let metadata = classifier().classify(&titled("Critical zero-day exploit in product X"));
        assert_eq!(metadata.risk, Risk::Critical);
    }

    #[test]
    fn test_cve_extracted_and_uppercased() {
        let item = RawFeedItem {
            description: Some("Patch for cve-2024-45678 released today".to_string()),
            ..Default::default()
        };
        assert_eq!(classifier().classify(&item).cve, "CVE-2024-45678");

        let item = RawFeedItem {
            content_encoded: Some("... CVE-2024-45678 ...".to_string()),
            ..Default::default()
        };
        assert_eq!(classifier().classify(&item).cve, "CVE-2024-45678");
    }

    #[test]
    fn test_cve_falls_back_to_title() {
        let metadata = classifier().classify(&titled("CVE-2023-1234 patched"));
        assert_eq!(metadata.cve, "CVE-2023-1234");
        assert_eq!(classifier().classify(&titled("Weekly notes")).cve, "N/A");
    }

    #[test]
    fn test_risk_precedence() {
        assert_eq!(
            classifier().classify(&titled("Severe ransomware campaign")).risk,
            Risk::High
        );
        assert_eq!(
            classifier().classify(&titled("Minor ransomware note")).risk,
            Risk::High
        );
        assert_eq!(
            classifier().classify(&titled("Minor update released")).risk,
            Risk::Low
        );
        assert_eq!(
            classifier().classify(&titled("Patch Tuesday roundup")).risk,
            Risk::Medium
        );
    }

    #[test]
    fn test_low_only_from_title() {
        let item = RawFeedItem {
            title: Some("Patch roundup".to_string()),
            description: Some("A minor issue with low impact".to_string()),
            ..Default::default()
        };
        assert_eq!(classifier().classify(&item).risk, Risk::Medium);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        // "apt" inside "adapter" and "low" inside "follow" must not count
        assert_eq!(
            classifier().classify(&titled("Network adapter follow-up")).risk,
            Risk::Medium
        );
    }

    #[test]
    fn test_snippet_bounds_content_matching() {
        let mut body = "x ".repeat(300);
        body.push_str("breach trojan");
        let item = RawFeedItem {
            title: Some("Roundup".to_string()),
            description: Some(body),
            ..Default::default()
        };
        let metadata = classifier().classify(&item);
        assert_eq!(metadata.risk, Risk::Medium);
        assert_eq!(metadata.malware, "N/A");
    }

    #[test]
    fn test_malware_detection_and_constants() {
        let item = RawFeedItem {
            title: Some("Campaign update".to_string()),
            description: Some("A new <b>trojan</b> spreads".to_string()),
            ..Default::default()
        };
        let metadata = classifier().classify(&item);
        assert_eq!(metadata.malware, "Detected");
        assert_eq!(metadata.country, "Global");
        assert_eq!(metadata.company, "Multiple");
        assert_eq!(metadata.affected, "Various Systems");
        assert_eq!(metadata.attack_vector, "Multiple Vectors");
    }
}
