// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Content Fingerprint Matcher
 * Digest-based version resolution for well-known WordPress script files
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// How many characters of normalized content the comment scan inspects.
/// Version headers sit at the top of every file that carries one.
const COMMENT_SCAN_WINDOW: usize = 2048;

/// Reference entry mapping a well-known script path to the content digest
/// observed across releases. One digest may cover several releases when the
/// file did not change between them.
#[derive(Debug, Clone)]
pub struct JsFingerprint {
    pub path: String,
    pub hash: String,
    pub versions: Vec<String>,
}

impl JsFingerprint {
    pub fn new(path: &str, hash: &str, versions: &[&str]) -> Self {
        Self {
            path: path.to_string(),
            hash: hash.to_string(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Reference entry for locating a version marker inside a plugin's own
/// script files. Paths and patterns are tried in order; the first pattern
/// match wins.
#[derive(Debug, Clone)]
pub struct PluginJsPattern {
    pub plugin: String,
    pub paths: Vec<String>,
    pub version_patterns: Vec<Regex>,
}

static VERSION_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+(?:\.\d+)?$").unwrap()
});

static COMMENT_VERSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"@version\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?i)WordPress\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r#"(?i)version['"]?\s*[:=]\s*['"]?v?(\d+\.\d+(?:\.\d+)?)"#).unwrap(),
    ]
});

/// Normalize fetched text so identical upstream files always digest to the
/// same value: strip a leading BOM, fold CRLF and lone CR to LF, trim.
pub fn normalize_content(content: &str) -> String {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// SHA-256 of already-normalized text, lowercase hex
pub fn digest(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize then digest in one step
pub fn content_digest(content: &str) -> String {
    digest(&normalize_content(content))
}

/// Scan the head of normalized content for a version-revealing comment.
/// Only a strict `major.minor[.patch]` candidate is accepted; anything
/// else is noise.
pub fn scan_comment_version(normalized: &str) -> Option<String> {
    let window: String = normalized.chars().take(COMMENT_SCAN_WINDOW).collect();
    for pattern in COMMENT_VERSION_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(&window) {
            let candidate = captures.get(1)?.as_str();
            if VERSION_SHAPE.is_match(candidate) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

/// Digest lookup over a fixed fingerprint table. Holds no network state;
/// callers hand it already-fetched text.
pub struct FingerprintMatcher<'a> {
    table: &'a [JsFingerprint],
}

impl<'a> FingerprintMatcher<'a> {
    pub fn new(table: &'a [JsFingerprint]) -> Self {
        Self { table }
    }

    /// Paths worth fetching, in table order, deduplicated
    pub fn paths(&self) -> Vec<&'a str> {
        let mut seen = Vec::new();
        for entry in self.table {
            if !seen.contains(&entry.path.as_str()) {
                seen.push(entry.path.as_str());
            }
        }
        seen
    }

    /// Resolve a digest to the full set of releases sharing it. Ambiguity is
    /// preserved here; narrowing is the aggregator's job.
    pub fn lookup(&self, hash: &str) -> Option<&'a [String]> {
        self.table
            .iter()
            .find(|entry| entry.hash == hash)
            .map(|entry| entry.versions.as_slice())
    }

    /// Digest fetched content for one known path and resolve it
    pub fn match_content(&self, path: &str, content: &str) -> Option<&'a [String]> {
        let normalized = normalize_content(content);
        let hash = digest(&normalized);
        self.table
            .iter()
            .find(|entry| entry.path == path && entry.hash == hash)
            .map(|entry| entry.versions.as_slice())
    }
}

/// Compare two dotted numeric versions segment by segment
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let left = parse(a);
    let right = parse(b);
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_bom_and_line_endings() {
        let raw = "\u{feff}var wp = 1;\r\nwp.embed = true;\rdone();\n";
        let normalized = normalize_content(raw);
        assert_eq!(normalized, "var wp = 1;\nwp.embed = true;\ndone();");
    }

    #[test]
    fn test_normalize_is_stable() {
        let raw = "  content with spaces  \r\n";
        let once = normalize_content(raw);
        let twice = normalize_content(&once);
        assert_eq!(once, twice);
        assert_eq!(digest(&once), digest(&twice));
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let hash = content_digest("hello");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // CRLF and plain LF content must collide after normalization
        assert_eq!(content_digest("a\r\nb"), content_digest("a\nb"));
    }

    #[test]
    fn test_comment_scan_accepts_strict_versions_only() {
        assert_eq!(
            scan_comment_version("/*! This file is auto-generated. @version 6.4.2 */"),
            Some("6.4.2".to_string())
        );
        assert_eq!(
            scan_comment_version("// WordPress 6.4 emoji support"),
            Some("6.4".to_string())
        );
        assert_eq!(scan_comment_version("version: 'latest'"), None);
        assert_eq!(scan_comment_version("no markers here"), None);
    }

    #[test]
    fn test_comment_scan_window_limit() {
        let padding = "x".repeat(COMMENT_SCAN_WINDOW + 10);
        let content = format!("{padding}\n@version 6.4.2");
        assert_eq!(scan_comment_version(&content), None);
    }

    #[test]
    fn test_lookup_preserves_ambiguity() {
        let table = vec![JsFingerprint::new(
            "wp-includes/js/wp-embed.min.js",
            "abc123",
            &["6.4", "6.4.1", "6.4.2"],
        )];
        let matcher = FingerprintMatcher::new(&table);
        let versions = matcher.lookup("abc123").unwrap();
        assert_eq!(versions.len(), 3);
        assert!(matcher.lookup("missing").is_none());
    }

    #[test]
    fn test_match_content_requires_path_and_hash() {
        let body = "window.wp = window.wp || {};";
        let table = vec![JsFingerprint::new(
            "wp-includes/js/wp-embed.min.js",
            &content_digest(body),
            &["6.4.2"],
        )];
        let matcher = FingerprintMatcher::new(&table);
        assert!(matcher
            .match_content("wp-includes/js/wp-embed.min.js", body)
            .is_some());
        assert!(matcher.match_content("wp-includes/js/other.js", body).is_none());
    }

    #[test]
    fn test_compare_versions() {
        use std::cmp::Ordering;
        assert_eq!(compare_versions("6.4.2", "6.4.2"), Ordering::Equal);
        assert_eq!(compare_versions("6.4.10", "6.4.9"), Ordering::Greater);
        assert_eq!(compare_versions("6.4", "6.4.1"), Ordering::Less);
        assert_eq!(compare_versions("10.0", "9.9.9"), Ordering::Greater);
    }
}
