// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Version Evidence Aggregator
 * Confidence-weighted reconciliation of version signals per component
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::fingerprint::compare_versions;
use crate::types::UNKNOWN_VERSION;

// Fixed per-source confidence weights. The exact-marker ceiling is 95;
// fingerprinting is capped strictly below it.
pub const CONFIDENCE_META_GENERATOR: u8 = 95;
pub const CONFIDENCE_README_HTML: u8 = 90;
pub const CONFIDENCE_OPML_GENERATOR: u8 = 88;
pub const CONFIDENCE_FEED_GENERATOR: u8 = 85;
pub const CONFIDENCE_REST_DISCOVERY: u8 = 90;
pub const CONFIDENCE_ASSET_QUERY: u8 = 70;
pub const CONFIDENCE_README_STABLE_TAG: u8 = 85;
pub const CONFIDENCE_STYLE_HEADER: u8 = 85;
pub const CONFIDENCE_SCRIPT_CONTENT: u8 = 75;
pub const CONFIDENCE_QUERY_HINT: u8 = 60;
pub const CONFIDENCE_METADATA_PRESENT: u8 = 60;

pub const FINGERPRINT_BASE_CONFIDENCE: u8 = 70;
pub const FINGERPRINT_MATCH_BONUS: u8 = 5;
pub const FINGERPRINT_MATCH_BONUS_CAP: u8 = 15;
pub const FINGERPRINT_NARROW_BONUS: u8 = 5;
pub const FINGERPRINT_CEILING: u8 = 90;

/// Version knowledge for one component. `Absent` never appears inside an
/// evidence tuple; it is the aggregate answer when no source spoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedVersion {
    Absent,
    PresentUnknown,
    Concrete(String),
}

impl DetectedVersion {
    pub fn is_concrete(&self) -> bool {
        matches!(self, DetectedVersion::Concrete(_))
    }

    /// Output rendering: concrete versions verbatim, everything else the
    /// `unknown` sentinel
    pub fn render(&self) -> &str {
        match self {
            DetectedVersion::Concrete(version) => version,
            _ => UNKNOWN_VERSION,
        }
    }
}

/// Extraction method that produced a tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceSource {
    MetaGenerator,
    ReadmeHtml,
    OpmlGenerator,
    FeedGenerator,
    RestDiscovery,
    AssetQueryFrequency,
    Fingerprint,
    ReadmeStableTag,
    ScriptContent,
    QueryHint,
    StyleHeader,
}

impl EvidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::MetaGenerator => "meta-generator",
            EvidenceSource::ReadmeHtml => "readme-html",
            EvidenceSource::OpmlGenerator => "opml-generator",
            EvidenceSource::FeedGenerator => "feed-generator",
            EvidenceSource::RestDiscovery => "rest-discovery",
            EvidenceSource::AssetQueryFrequency => "asset-query-frequency",
            EvidenceSource::Fingerprint => "fingerprint",
            EvidenceSource::ReadmeStableTag => "readme-stable-tag",
            EvidenceSource::ScriptContent => "script-content",
            EvidenceSource::QueryHint => "query-hint",
            EvidenceSource::StyleHeader => "style-header",
        }
    }
}

impl std::fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate produced by a single extraction strategy. Ephemeral:
/// consumed by [`select_winner`] immediately after gathering.
#[derive(Debug, Clone)]
pub struct VersionEvidence {
    pub version: DetectedVersion,
    pub confidence: u8,
    pub source: EvidenceSource,
}

impl VersionEvidence {
    pub fn concrete(version: &str, confidence: u8, source: EvidenceSource) -> Self {
        Self {
            version: DetectedVersion::Concrete(version.to_string()),
            confidence,
            source,
        }
    }

    pub fn present(confidence: u8, source: EvidenceSource) -> Self {
        Self {
            version: DetectedVersion::PresentUnknown,
            confidence,
            source,
        }
    }
}

/// Two-tier winner selection: concreteness strictly before confidence, then
/// higher confidence, remaining ties resolved by registration order. A
/// low-confidence concrete version must outrank a high-confidence sentinel.
pub fn select_winner(candidates: &[VersionEvidence]) -> Option<&VersionEvidence> {
    let mut winner: Option<&VersionEvidence> = None;
    for candidate in candidates {
        let better = match winner {
            None => true,
            Some(current) => {
                match (candidate.version.is_concrete(), current.version.is_concrete()) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => candidate.confidence > current.confidence,
                }
            }
        };
        if better {
            winner = Some(candidate);
        }
    }
    winner
}

static STRICT_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+(?:\.\d+)?$").unwrap()
});

static GENERATOR_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)wordpress\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap()
});

static README_HTML_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)version\s+(\d+\.\d+(?:\.\d+)?)").unwrap()
});

static OPML_GENERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)generator\s*=\s*["']wordpress/(\d+\.\d+(?:\.\d+)?)["']"#).unwrap()
});

static FEED_GENERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<generator>[^<]*?[?&]v=(\d+\.\d+(?:\.\d+)?)\s*</generator>").unwrap()
});

static STABLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*stable\s+tag:\s*v?([0-9a-z.\-]+)").unwrap()
});

static README_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^===\s*(.+?)\s*===").unwrap()
});

static STYLE_THEME_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:\*\s*)?theme\s+name:\s*(.+?)\s*$").unwrap()
});

static STYLE_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:\*\s*)?version:\s*v?(\d+[\d.]*)\s*$").unwrap()
});

static COMPONENT_QUERY_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)/wp-content/(plugins|themes)/([a-z0-9][a-z0-9_.\-]*)/[^"'\s<>]*\?[^"'\s<>]*\bver=([0-9][0-9.]*)"#,
    )
    .unwrap()
});

static VER_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&]ver=([0-9][0-9.]*)").unwrap()
});

fn is_strict_version(candidate: &str) -> bool {
    STRICT_VERSION.is_match(candidate)
}

/// Version from the landing page's generator meta tag
pub fn extract_meta_generator(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta").unwrap();
    for element in document.select(&selector) {
        let is_generator = element
            .value()
            .attr("name")
            .is_some_and(|name| name.eq_ignore_ascii_case("generator"));
        if !is_generator {
            continue;
        }
        if let Some(content) = element.value().attr("content") {
            if let Some(captures) = GENERATOR_VERSION.captures(content) {
                return Some(captures[1].to_string());
            }
        }
    }
    None
}

/// Version from the /readme.html install page
pub fn extract_readme_html_version(body: &str) -> Option<String> {
    README_HTML_VERSION
        .captures(body)
        .map(|captures| captures[1].to_string())
        .filter(|v| is_strict_version(v))
}

/// Version from the wp-links-opml.php generator comment
pub fn extract_opml_generator(body: &str) -> Option<String> {
    OPML_GENERATOR
        .captures(body)
        .map(|captures| captures[1].to_string())
}

/// Version from the RSS feed generator element
pub fn extract_feed_generator(body: &str) -> Option<String> {
    FEED_GENERATOR
        .captures(body)
        .map(|captures| captures[1].to_string())
}

/// Whether a wp-json discovery body confirms the platform. The document
/// never exposes a core version; reachability alone is the signal.
pub fn rest_discovery_confirms(body: &str) -> bool {
    body.contains("wp/v2") || body.contains("\"namespaces\"")
}

/// Most frequent `ver=` value across static-asset URLs in the landing page.
/// Frequency ties keep the first-seen value. Known to misfire on sites where
/// many plugin assets share a version string; every exact marker outranks it.
pub fn asset_query_frequency(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[src], link[href], img[src]").unwrap();

    let mut counts: Vec<(String, usize)> = Vec::new();
    for element in document.select(&selector) {
        let value = element
            .value()
            .attr("src")
            .or_else(|| element.value().attr("href"));
        let Some(url) = value else { continue };
        if !url.contains("/wp-includes/") && !url.contains("/wp-content/") {
            continue;
        }
        let Some(captures) = VER_PARAM.captures(url) else { continue };
        let version = captures[1].to_string();
        // Cache busters (?ver=3) and malformed fragments are not versions
        if !is_strict_version(&version) {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == version) {
            Some((_, count)) => *count += 1,
            None => counts.push((version, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (version, count) in &counts {
        let better = match best {
            None => true,
            Some((_, best_count)) => *count > best_count,
        };
        if better {
            best = Some((version, *count));
        }
    }
    best.map(|(version, _)| version.to_string())
}

/// `ver=` hint for one specific component's own assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHint {
    pub slug: String,
    pub theme: bool,
    pub version: String,
}

/// Harvest per-component `ver=` hints from raw landing-page text. First hint
/// per slug wins; later duplicates are dropped.
pub fn collect_query_hints(body: &str) -> Vec<QueryHint> {
    let mut hints: Vec<QueryHint> = Vec::new();
    for captures in COMPONENT_QUERY_HINT.captures_iter(body) {
        let slug = captures[2].to_lowercase();
        let theme = captures[1].eq_ignore_ascii_case("themes");
        if hints.iter().any(|h| h.slug == slug && h.theme == theme) {
            continue;
        }
        hints.push(QueryHint {
            slug,
            theme,
            version: captures[3].to_string(),
        });
    }
    hints
}

/// Stable tag from a plugin readme.txt; `trunk` and other non-numeric tags
/// are rejected
pub fn extract_stable_tag(readme: &str) -> Option<String> {
    for line in readme.lines().take(60) {
        if let Some(captures) = STABLE_TAG.captures(line) {
            let candidate = captures[1].to_string();
            if is_strict_version(&candidate) {
                return Some(candidate);
            }
            return None;
        }
    }
    None
}

/// Plugin display name from the `=== Name ===` readme heading
pub fn extract_readme_title(readme: &str) -> Option<String> {
    README_TITLE
        .captures(readme)
        .map(|captures| captures[1].trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Whether fetched text is shaped like a WordPress plugin readme at all
pub fn looks_like_plugin_readme(body: &str) -> bool {
    let head: String = body.chars().take(4096).collect();
    head.contains("=== ")
        || head.to_lowercase().contains("stable tag")
        || head.contains("Contributors:")
}

/// Parsed headers from a theme's style.css
#[derive(Debug, Clone, Default)]
pub struct ThemeHeader {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl ThemeHeader {
    pub fn is_theme(&self) -> bool {
        self.name.is_some()
    }
}

/// Theme Name / Version headers from the top of a style.css
pub fn extract_style_header(css: &str) -> ThemeHeader {
    let head: String = css.lines().take(40).collect::<Vec<_>>().join("\n");
    ThemeHeader {
        name: STYLE_THEME_NAME
            .captures(&head)
            .map(|captures| captures[1].trim().to_string())
            .filter(|name| !name.is_empty()),
        version: STYLE_VERSION
            .captures(&head)
            .map(|captures| captures[1].to_string())
            .filter(|v| is_strict_version(v)),
    }
}

/// First version produced by a pattern list against script content
pub fn extract_script_version(content: &str, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(captures) = pattern.captures(content) {
            if let Some(candidate) = captures.get(1) {
                let candidate = candidate.as_str();
                if is_strict_version(candidate) {
                    return Some(candidate.to_string());
                }
            }
        }
    }
    None
}

/// Fold per-file fingerprint matches into one evidence tuple.
///
/// The version sets of all matching files are intersected (falling back to
/// the first set when the intersection is empty); a comment-scanned version
/// that lands inside the set narrows it to exactly that release. Confidence
/// grows with corroborating matches and with set specificity, capped
/// strictly below the exact-marker ceiling.
pub fn fingerprint_evidence(
    matched_sets: &[Vec<String>],
    comment_version: Option<&str>,
) -> Option<VersionEvidence> {
    if matched_sets.is_empty() {
        return None;
    }

    let mut set: Vec<String> = matched_sets[0].clone();
    for other in &matched_sets[1..] {
        let narrowed: Vec<String> = set
            .iter()
            .filter(|version| other.contains(version))
            .cloned()
            .collect();
        if !narrowed.is_empty() {
            set = narrowed;
        }
    }

    if let Some(comment) = comment_version {
        if set.iter().any(|version| version == comment) {
            set = vec![comment.to_string()];
        }
    }

    let version = set
        .iter()
        .max_by(|a, b| compare_versions(a, b))?
        .clone();

    let corroborating = matched_sets.len().saturating_sub(1).min(usize::from(
        FINGERPRINT_MATCH_BONUS_CAP / FINGERPRINT_MATCH_BONUS,
    )) as u8;
    let mut confidence = FINGERPRINT_BASE_CONFIDENCE + corroborating * FINGERPRINT_MATCH_BONUS;
    if set.len() <= 2 {
        confidence += FINGERPRINT_NARROW_BONUS;
    }
    confidence = confidence.min(FINGERPRINT_CEILING);

    Some(VersionEvidence::concrete(
        &version,
        confidence,
        EvidenceSource::Fingerprint,
    ))
}
