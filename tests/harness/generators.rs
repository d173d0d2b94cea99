// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of distinct client identifiers.
pub fn generate_client_ids(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(100, a, b, c)).to_string()
        })
        .collect()
}

/// Markup and script injection attempts seen in hostile feed text.
pub fn generate_xss_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<SCRIPT SRC=//evil.example/x.js></SCRIPT>",
        "<scr<script>ipt>alert(1)</scr</script>ipt>",
        "<img src=x onerror=alert(1)>",
        "<svg/onload=alert(1)>",
        "<body onload = alert(1)>",
        "oonerror=nerror=alert(1)",
        "<a href=\"javascript:alert(1)\">click</a>",
        "JaVaScRiPt:alert(document.cookie)",
        "jajavascript:vascript:alert(1)",
        "jav&#x61;script:alert(1)",
        "&#60;script&#62;alert(1)&#60;/script&#62;",
        "&#x3C;iframe src=//evil.example&#x3E;",
        "&lt;script&gt;alert(1)&lt;/script&gt;",
        "&lt; iframe src=//evil.example&gt;",
        "data:text/html;base64,PHNjcmlwdD5hbGVydCgxKTwvc2NyaXB0Pg==",
        "vbscript:msgbox(1)",
        "\u{FF1C}script\u{FF1E}alert(1)\u{FF1C}/script\u{FF1E}",
        "ｊａｖａｓｃｒｉｐｔ:alert(1)",
        "<iframe src=\"https://evil.example\"></iframe>",
        "before\u{0}<script>\u{0}alert(1)</script>after",
        "line\u{7}bell\u{1B}[31mred",
    ]
}

/// Substrings that must never survive sanitization (compared lowercased).
pub fn forbidden_fragments() -> Vec<&'static str> {
    vec![
        "<script",
        "<iframe",
        "</script",
        "javascript:",
        "vbscript:",
        "data:",
        "onerror=",
        "onload=",
        "onload =",
        "&#",
        "&lt;script",
        "&lt; iframe",
        "\u{0}",
        "\u{7}",
        "\u{1b}",
    ]
}

/// URLs pointing at local or private infrastructure, or using unsafe
/// schemes. Every one must be rejected as both an image and a link.
pub fn generate_ssrf_urls() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "not-a-url",
        "https://",
        "javascript:alert(1)",
        "data:image/png;base64,AAAA",
        "file:///etc/passwd",
        "ftp://example.com/x.png",
        "gopher://example.com/x.png",
        "https://localhost/x.png",
        "https://LOCALHOST./x.png",
        "https://printer.local/x.png",
        "https://127.0.0.1/x.png",
        "https://127.1/x.png",
        "https://2130706433/x.png",
        "https://0x7f000001/x.png",
        "https://0.0.0.0/x.png",
        "https://10.1.2.3/x.png",
        "https://172.16.0.1/x.png",
        "https://172.31.255.254/x.png",
        "https://192.168.1.1/x.png",
        "https://169.254.169.254/latest/meta-data/x.png",
        "https://255.255.255.255/x.png",
        "https://[::1]/x.png",
        "https://[::]/x.png",
        "https://[fd00::1]/x.png",
        "https://[fe80::1]/x.png",
        "https://[::ffff:127.0.0.1]/x.png",
        "https://[::ffff:10.0.0.1]/x.png",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_client_ids() {
        let ids = generate_client_ids(70_000);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 70_000);
    }
}
