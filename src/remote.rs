// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Site Inference Orchestrator
 * Drives remote WordPress inventory scans end to end
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScanOptions;
use crate::errors::ScanResult;
use crate::evidence::{
    self, EvidenceSource, QueryHint, VersionEvidence, CONFIDENCE_ASSET_QUERY,
    CONFIDENCE_FEED_GENERATOR, CONFIDENCE_META_GENERATOR, CONFIDENCE_METADATA_PRESENT,
    CONFIDENCE_OPML_GENERATOR, CONFIDENCE_QUERY_HINT, CONFIDENCE_README_HTML,
    CONFIDENCE_README_STABLE_TAG, CONFIDENCE_REST_DISCOVERY, CONFIDENCE_SCRIPT_CONTENT,
    CONFIDENCE_STYLE_HEADER,
};
use crate::fingerprint::{self, FingerprintMatcher, JsFingerprint};
use crate::http_client::FetchClient;
use crate::refdata;
use crate::types::{
    title_case_slug, ComponentKind, DetectedComponent, DetectionResult, DetectionSource, SiteMeta,
};

static GENERATOR_META_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<meta[^>]*generator[^>]*wordpress").unwrap()
});

static PLUGIN_PATH_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/wp-content/plugins/([a-z0-9][a-z0-9_.\-]*)/").unwrap()
});

static THEME_PATH_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/wp-content/themes/([a-z0-9][a-z0-9_.\-]*)/").unwrap()
});

/// Path-structure words that look like slugs but never are
const PATH_ARTIFACTS: &[&str] = &["plugin", "plugins", "theme", "themes"];

struct NegotiatedSite {
    base_url: String,
    scheme: String,
    landing_body: String,
    server: Option<String>,
}

/// Unauthenticated remote inventory scanner. One instance per scan
/// invocation; all state lives in the options and the shared fetch client.
pub struct RemoteScanner {
    client: Arc<FetchClient>,
    options: ScanOptions,
    fingerprints: Vec<JsFingerprint>,
}

impl RemoteScanner {
    pub fn new(options: ScanOptions) -> ScanResult<Self> {
        let client = Arc::new(FetchClient::new(&options)?);
        Ok(Self {
            client,
            options,
            fingerprints: refdata::core_fingerprints().to_vec(),
        })
    }

    /// Replace the core fingerprint table, e.g. with a freshly generated one
    pub fn with_fingerprints(mut self, table: Vec<JsFingerprint>) -> Self {
        self.fingerprints = table;
        self
    }

    pub fn client(&self) -> Arc<FetchClient> {
        Arc::clone(&self.client)
    }

    /// Run the full scan state machine. Always returns a result; every
    /// failure mode ends up in `errors`, never as an Err.
    pub async fn scan(&self, target: &str) -> DetectionResult {
        let mut result = DetectionResult::new(target, DetectionSource::Remote);
        info!(target = %target, "Starting remote inventory scan");

        let Some(site) = self.negotiate_scheme(target).await else {
            warn!(target = %target, "No WordPress installation found on any scheme");
            result
                .errors
                .push("no WordPress installation detected at target under any scheme".to_string());
            return result;
        };
        result.site = Some(SiteMeta {
            url: site.base_url.clone(),
            scheme: site.scheme.clone(),
            server: site.server.clone(),
        });

        // Core first: probing plugins against a site whose core cannot be
        // confirmed is wasted work.
        let Some(core) = self.detect_core(&site.base_url, &site.landing_body).await else {
            warn!(target = %target, "WordPress core version could not be established");
            result
                .errors
                .push("WordPress core version could not be established".to_string());
            return result;
        };
        result.core = Some(core);

        let hints = evidence::collect_query_hints(&site.landing_body);
        let (plugin_candidates, theme_candidates) = build_candidate_sets(&site.landing_body);
        debug!(
            plugins = plugin_candidates.len(),
            themes = theme_candidates.len(),
            hints = hints.len(),
            "Candidate sets constructed"
        );

        // Fan-out is logically unbounded; the fetch limiter alone enforces
        // the concurrency ceiling. Output keeps candidate order, not
        // completion order.
        let plugin_detections = join_all(
            plugin_candidates
                .iter()
                .map(|slug| self.detect_plugin(&site.base_url, slug, &hints)),
        );
        let theme_detections = join_all(
            theme_candidates
                .iter()
                .map(|slug| self.detect_theme(&site.base_url, slug, &hints)),
        );
        let (plugin_results, theme_results) = futures::join!(plugin_detections, theme_detections);

        result.plugins = plugin_results.into_iter().flatten().collect();
        result.themes = theme_results.into_iter().flatten().collect();

        info!(
            target = %target,
            plugins = result.plugins.len(),
            themes = result.themes.len(),
            "Remote inventory scan complete"
        );
        result
    }

    /// Try the target as given, then the flipped scheme; accept the first
    /// candidate that answers with a WordPress-looking landing page.
    async fn negotiate_scheme(&self, target: &str) -> Option<NegotiatedSite> {
        for candidate in candidate_urls(target) {
            if Url::parse(&candidate).is_err() {
                continue;
            }
            debug!(url = %candidate, "Trying scheme candidate");
            let Some(response) = self.client.fetch_response(&format!("{candidate}/")).await
            else {
                continue;
            };
            if !response.is_success() || !has_wordpress_indicators(&response.body) {
                continue;
            }
            let scheme = candidate
                .split("://")
                .next()
                .unwrap_or("https")
                .to_string();
            let server = response.header("server").map(|value| value.to_string());
            debug!(url = %candidate, "WordPress indicators confirmed");
            return Some(NegotiatedSite {
                base_url: candidate,
                scheme,
                landing_body: response.body,
                server,
            });
        }
        None
    }

    /// Gather core evidence in declared source order, then select
    async fn detect_core(&self, base_url: &str, landing_body: &str) -> Option<DetectedComponent> {
        let mut candidates: Vec<VersionEvidence> = Vec::new();

        if let Some(version) = evidence::extract_meta_generator(landing_body) {
            debug!(version = %version, "Core version from generator meta");
            candidates.push(VersionEvidence::concrete(
                &version,
                CONFIDENCE_META_GENERATOR,
                EvidenceSource::MetaGenerator,
            ));
        }

        if let Some(body) = self.client.fetch(&format!("{base_url}/readme.html")).await {
            if let Some(version) = evidence::extract_readme_html_version(&body) {
                debug!(version = %version, "Core version from readme.html");
                candidates.push(VersionEvidence::concrete(
                    &version,
                    CONFIDENCE_README_HTML,
                    EvidenceSource::ReadmeHtml,
                ));
            }
        }

        if let Some(body) = self
            .client
            .fetch(&format!("{base_url}/wp-links-opml.php"))
            .await
        {
            if let Some(version) = evidence::extract_opml_generator(&body) {
                debug!(version = %version, "Core version from OPML generator");
                candidates.push(VersionEvidence::concrete(
                    &version,
                    CONFIDENCE_OPML_GENERATOR,
                    EvidenceSource::OpmlGenerator,
                ));
            }
        }

        if let Some(body) = self.client.fetch(&format!("{base_url}/feed/")).await {
            if let Some(version) = evidence::extract_feed_generator(&body) {
                debug!(version = %version, "Core version from feed generator");
                candidates.push(VersionEvidence::concrete(
                    &version,
                    CONFIDENCE_FEED_GENERATOR,
                    EvidenceSource::FeedGenerator,
                ));
            }
        }

        if let Some(response) = self
            .client
            .fetch_response(&format!("{base_url}/wp-json/"))
            .await
        {
            if response.is_success() && evidence::rest_discovery_confirms(&response.body) {
                debug!("REST discovery document reachable");
                candidates.push(VersionEvidence::present(
                    CONFIDENCE_REST_DISCOVERY,
                    EvidenceSource::RestDiscovery,
                ));
            }
        }

        if let Some(version) = evidence::asset_query_frequency(landing_body) {
            debug!(version = %version, "Core version candidate from asset query frequency");
            candidates.push(VersionEvidence::concrete(
                &version,
                CONFIDENCE_ASSET_QUERY,
                EvidenceSource::AssetQueryFrequency,
            ));
        }

        // Fingerprinting is a fallback: only when nothing concrete exists yet
        let have_concrete = candidates.iter().any(|c| c.version.is_concrete());
        if !have_concrete && self.options.fingerprint_enabled {
            if let Some(fingerprint_tuple) = self.fingerprint_core(base_url).await {
                candidates.push(fingerprint_tuple);
            }
        }

        let winner = evidence::select_winner(&candidates)?;
        debug!(
            version = %winner.version.render(),
            confidence = winner.confidence,
            source = %winner.source,
            "Core version selected"
        );
        Some(DetectedComponent::new(
            ComponentKind::Core,
            "wordpress",
            "WordPress",
            &winner.version.render(),
            winner.confidence,
            DetectionSource::Remote,
        ))
    }

    /// Digest well-known core scripts against the fingerprint table
    async fn fingerprint_core(&self, base_url: &str) -> Option<VersionEvidence> {
        let matcher = FingerprintMatcher::new(&self.fingerprints);
        let mut matched_sets: Vec<Vec<String>> = Vec::new();
        let mut comment_version: Option<String> = None;

        for path in matcher.paths() {
            let url = format!("{base_url}/{path}");
            let Some(content) = self.client.fetch(&url).await else {
                continue;
            };
            let normalized = fingerprint::normalize_content(&content);
            if comment_version.is_none() {
                comment_version = fingerprint::scan_comment_version(&normalized);
            }
            let hash = fingerprint::digest(&normalized);
            if let Some(versions) = matcher.lookup(&hash) {
                debug!(path = %path, candidates = versions.len(), "Fingerprint match");
                matched_sets.push(versions.to_vec());
            }
        }

        evidence::fingerprint_evidence(&matched_sets, comment_version.as_deref())
    }

    /// Plugin evidence: readme stable tag, then script content, then the
    /// landing-page query hint
    async fn detect_plugin(
        &self,
        base_url: &str,
        slug: &str,
        hints: &[QueryHint],
    ) -> Option<DetectedComponent> {
        let mut candidates: Vec<VersionEvidence> = Vec::new();
        let mut display_name: Option<String> = None;

        let readme_url = format!("{base_url}/wp-content/plugins/{slug}/readme.txt");
        if let Some(body) = self.client.fetch(&readme_url).await {
            if let Some(version) = evidence::extract_stable_tag(&body) {
                candidates.push(VersionEvidence::concrete(
                    &version,
                    CONFIDENCE_README_STABLE_TAG,
                    EvidenceSource::ReadmeStableTag,
                ));
            } else if evidence::looks_like_plugin_readme(&body) {
                candidates.push(VersionEvidence::present(
                    CONFIDENCE_METADATA_PRESENT,
                    EvidenceSource::ReadmeStableTag,
                ));
            }
            display_name = evidence::extract_readme_title(&body);
        }

        let have_concrete = candidates.iter().any(|c| c.version.is_concrete());
        if !have_concrete {
            if let Some(version) = self.plugin_script_version(base_url, slug).await {
                candidates.push(VersionEvidence::concrete(
                    &version,
                    CONFIDENCE_SCRIPT_CONTENT,
                    EvidenceSource::ScriptContent,
                ));
            }
        }

        if let Some(hint) = hints.iter().find(|h| !h.theme && h.slug == slug) {
            candidates.push(VersionEvidence::concrete(
                &hint.version,
                CONFIDENCE_QUERY_HINT,
                EvidenceSource::QueryHint,
            ));
        }

        let winner = evidence::select_winner(&candidates)?;
        debug!(
            slug = %slug,
            version = %winner.version.render(),
            source = %winner.source,
            "Plugin detected"
        );
        let name = display_name.unwrap_or_else(|| title_case_slug(slug));
        Some(DetectedComponent::new(
            ComponentKind::Plugin,
            slug,
            &name,
            &winner.version.render(),
            winner.confidence,
            DetectionSource::Remote,
        ))
    }

    /// Search the plugin's own scripts for a version marker
    async fn plugin_script_version(&self, base_url: &str, slug: &str) -> Option<String> {
        let (paths, patterns): (Vec<String>, &[Regex]) = match refdata::plugin_js_pattern(slug) {
            Some(entry) => (entry.paths.clone(), entry.version_patterns.as_slice()),
            None => (
                refdata::default_plugin_script_paths(slug),
                refdata::generic_script_patterns(),
            ),
        };

        for path in paths {
            let url = format!("{base_url}/wp-content/plugins/{slug}/{path}");
            let Some(content) = self.client.fetch(&url).await else {
                continue;
            };
            if let Some(version) = evidence::extract_script_version(&content, patterns) {
                return Some(version);
            }
        }
        None
    }

    /// Theme evidence: style.css headers, then the landing-page query hint
    async fn detect_theme(
        &self,
        base_url: &str,
        slug: &str,
        hints: &[QueryHint],
    ) -> Option<DetectedComponent> {
        let mut candidates: Vec<VersionEvidence> = Vec::new();
        let mut display_name: Option<String> = None;

        let style_url = format!("{base_url}/wp-content/themes/{slug}/style.css");
        if let Some(body) = self.client.fetch(&style_url).await {
            let header = evidence::extract_style_header(&body);
            if let Some(version) = &header.version {
                candidates.push(VersionEvidence::concrete(
                    version,
                    CONFIDENCE_STYLE_HEADER,
                    EvidenceSource::StyleHeader,
                ));
            } else if header.is_theme() {
                candidates.push(VersionEvidence::present(
                    CONFIDENCE_METADATA_PRESENT,
                    EvidenceSource::StyleHeader,
                ));
            }
            display_name = header.name;
        }

        if let Some(hint) = hints.iter().find(|h| h.theme && h.slug == slug) {
            candidates.push(VersionEvidence::concrete(
                &hint.version,
                CONFIDENCE_QUERY_HINT,
                EvidenceSource::QueryHint,
            ));
        }

        let winner = evidence::select_winner(&candidates)?;
        debug!(
            slug = %slug,
            version = %winner.version.render(),
            source = %winner.source,
            "Theme detected"
        );
        let name = display_name.unwrap_or_else(|| title_case_slug(slug));
        Some(DetectedComponent::new(
            ComponentKind::Theme,
            slug,
            &name,
            &winner.version.render(),
            winner.confidence,
            DetectionSource::Remote,
        ))
    }
}

/// Scheme candidates in trial order
fn candidate_urls(target: &str) -> Vec<String> {
    let trimmed = target.trim().trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        vec![format!("https://{rest}"), format!("http://{rest}")]
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        vec![format!("http://{rest}"), format!("https://{rest}")]
    } else {
        vec![format!("https://{trimmed}"), format!("http://{trimmed}")]
    }
}

fn has_wordpress_indicators(body: &str) -> bool {
    body.contains("wp-content")
        || body.contains("wp-includes")
        || body.contains("wp-json")
        || body.contains("/wp-admin/")
        || GENERATOR_META_TAG.is_match(body)
}

/// Union of the built-in slug lists and slugs scraped from the landing
/// page, deduplicated case-insensitively, path-artifact words excluded
fn build_candidate_sets(body: &str) -> (Vec<String>, Vec<String>) {
    let mut plugins: Vec<String> = refdata::well_known_plugins()
        .iter()
        .map(|slug| slug.to_string())
        .collect();
    for captures in PLUGIN_PATH_SLUG.captures_iter(body) {
        let slug = captures[1].to_lowercase();
        if PATH_ARTIFACTS.contains(&slug.as_str()) || plugins.contains(&slug) {
            continue;
        }
        plugins.push(slug);
    }

    let mut themes: Vec<String> = refdata::well_known_themes()
        .iter()
        .map(|slug| slug.to_string())
        .collect();
    for captures in THEME_PATH_SLUG.captures_iter(body) {
        let slug = captures[1].to_lowercase();
        if PATH_ARTIFACTS.contains(&slug.as_str()) || themes.contains(&slug) {
            continue;
        }
        themes.push(slug);
    }

    (plugins, themes)
}
