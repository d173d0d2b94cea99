// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Untrusted text sanitizer.
//!
//! Reduces feed text to plain, inert characters:
//! 1. NFKC normalization
//! 2. NUL removal
//! 3. markup tags
//! 4. `javascript:`, `data:`, `vbscript:` prefixes
//! 5. inline event handlers (`onclick=`)
//! 6. entity-encoded `<script` / `<iframe` markers
//! 7. numeric character references
//! 8. remaining control characters
//! 9. truncation to the configured length
//!
//! Steps 3-8 repeat until the text stops changing, so a pattern cannot be
//! reassembled from the pieces left by removing another one. Input is
//! bounded before normalization and the repetition is capped; text still
//! changing after the last pass loses every `<`, `>`, `:`, `=` and `&`,
//! without which none of the patterns can match.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Raw input beyond `max_len * INPUT_FACTOR` characters is never looked at.
const INPUT_FACTOR: usize = 16;
const MAX_PASSES: usize = 8;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static SCHEME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:|data:|vbscript:").unwrap());
static EVENT_HANDLER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+\s*=").unwrap());
static ENCODED_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&lt;\s*(script|iframe)").unwrap());
static CHAR_REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&#(x[0-9a-f]*|[0-9]*);?").unwrap());
static INERT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>:=&\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());
static CONTROL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

/// Strips untrusted feed text down to safe plain text. Never fails.
#[derive(Debug, Clone)]
pub struct ContentSanitizer {
    max_len: usize,
}

impl ContentSanitizer {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Sanitize optional input; absent input becomes an empty string.
    pub fn sanitize_opt(&self, raw: Option<&str>) -> String {
        raw.map(|s| self.sanitize(s)).unwrap_or_default()
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let bounded = truncate_chars(raw, self.max_len.saturating_mul(INPUT_FACTOR));
        let mut text: String = bounded.nfkc().filter(|c| *c != '\0').collect();

        let mut settled = false;
        for _ in 0..MAX_PASSES {
            let next = strip_once(&text);
            if next == text {
                settled = true;
                break;
            }
            text = next;
        }
        if !settled {
            text = INERT_PATTERN.replace_all(&text, "").into_owned();
        }

        truncate_chars(&text, self.max_len)
    }
}

fn strip_once(input: &str) -> String {
    let text = TAG_PATTERN.replace_all(input, "");
    let text = SCHEME_PATTERN.replace_all(&text, "");
    let text = EVENT_HANDLER_PATTERN.replace_all(&text, "");
    let text = ENCODED_MARKER_PATTERN.replace_all(&text, "");
    let text = CHAR_REFERENCE_PATTERN.replace_all(&text, "");
    CONTROL_PATTERN.replace_all(&text, "").into_owned()
}

/// Keep at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
