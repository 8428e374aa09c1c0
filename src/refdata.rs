// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Detection Reference Data
 * Static vendor, slug, fingerprint and script-pattern tables
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fingerprint::{JsFingerprint, PluginJsPattern};

// ============================================================
// Vendor resolution
// ============================================================

/// Slug -> CPE vendor for components whose vendor differs from the slug.
/// Slugs absent from this table fall back to prefix inference and finally
/// to the slug itself.
static KNOWN_VENDORS: &[(&str, &str)] = &[
    ("contact-form-7", "rocklobster"),
    ("akismet", "automattic"),
    ("jetpack", "automattic"),
    ("wp-super-cache", "automattic"),
    ("woocommerce", "woocommerce"),
    ("elementor", "elementor"),
    ("wordfence", "defiant"),
    ("wordpress-seo", "yoast"),
    ("duplicate-post", "yoast"),
    ("wpforms-lite", "wpforms"),
    ("wp-mail-smtp", "wpforms"),
    ("all-in-one-seo-pack", "aioseo"),
    ("really-simple-ssl", "really-simple-plugins"),
    ("updraftplus", "updraftplus"),
    ("w3-total-cache", "boldgrid"),
    ("litespeed-cache", "litespeed-technologies"),
    ("classic-editor", "wordpress"),
    ("google-site-kit", "google"),
    ("redirection", "johngodley"),
    ("advanced-custom-fields", "wpengine"),
    ("mailchimp-for-wp", "ibericode"),
    ("astra", "brainstormforce"),
    ("hello-elementor", "elementor"),
    ("neve", "themeisle"),
];

/// Vendor names recognized when inferring a vendor from a slug prefix,
/// e.g. `jetpack-boost` -> `jetpack`.
static KNOWN_VENDOR_NAMES: &[&str] = &[
    "automattic",
    "jetpack",
    "yoast",
    "woocommerce",
    "elementor",
    "wpforms",
    "google",
    "wordfence",
    "litespeed",
    "updraftplus",
];

pub fn known_vendor(slug: &str) -> Option<&'static str> {
    KNOWN_VENDORS
        .iter()
        .find(|(known_slug, _)| *known_slug == slug)
        .map(|(_, vendor)| *vendor)
}

pub fn is_known_vendor_name(name: &str) -> bool {
    KNOWN_VENDOR_NAMES.contains(&name)
}

// ============================================================
// Candidate slug lists
// ============================================================

/// Plugins probed on every remote scan regardless of landing-page discovery
static WELL_KNOWN_PLUGINS: &[&str] = &[
    "akismet",
    "jetpack",
    "woocommerce",
    "elementor",
    "contact-form-7",
    "wordfence",
    "wordpress-seo",
    "all-in-one-seo-pack",
    "wpforms-lite",
    "really-simple-ssl",
    "classic-editor",
    "updraftplus",
    "wp-super-cache",
    "w3-total-cache",
    "litespeed-cache",
    "duplicate-post",
    "google-site-kit",
    "wp-mail-smtp",
    "redirection",
    "mailchimp-for-wp",
];

/// Themes probed on every remote scan
static WELL_KNOWN_THEMES: &[&str] = &[
    "twentytwentyfive",
    "twentytwentyfour",
    "twentytwentythree",
    "twentytwentytwo",
    "twentytwentyone",
    "twentytwenty",
    "astra",
    "oceanwp",
    "generatepress",
    "hello-elementor",
    "neve",
    "kadence",
];

pub fn well_known_plugins() -> &'static [&'static str] {
    WELL_KNOWN_PLUGINS
}

pub fn well_known_themes() -> &'static [&'static str] {
    WELL_KNOWN_THEMES
}

// ============================================================
// Core script fingerprints
// ============================================================

/// Core script paths fetched for fingerprinting, relative to the site root
pub static CORE_FINGERPRINT_PATHS: &[&str] = &[
    "wp-includes/js/wp-embed.min.js",
    "wp-includes/js/wp-emoji-release.min.js",
    "wp-includes/js/wp-auth-check.min.js",
];

/// Digest table for the paths above. A digest covering several releases is
/// normal: these files frequently survive patch releases unchanged.
static CORE_FINGERPRINTS: Lazy<Vec<JsFingerprint>> = Lazy::new(|| {
    vec![
        JsFingerprint::new(
            "wp-includes/js/wp-embed.min.js",
            "e9d6f0bcf02ced931edec285f3c99ece3b64f1e0809dbf33b8ee6bef8e7c882e",
            &["6.4", "6.4.1"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-embed.min.js",
            "92bb6b8974d764ba6e39e1eb007d52723ba028132a59effc9edcab3df57fdac2",
            &["6.4.2", "6.4.3"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-embed.min.js",
            "4558e89d48813fa63f8db72d25123e801ed124a5b0fa4fc25ac71f11f0f2d17d",
            &["6.5", "6.5.1", "6.5.2"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-emoji-release.min.js",
            "355f5e9a22cb353cb309a18bd780a1ce5a59ccd909d66286ac64ece7a97474c1",
            &["6.4", "6.4.1"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-emoji-release.min.js",
            "6d04a5e9a92c829244047b57d0783eceb4d437f04531893c7484b012fe40ef6f",
            &["6.4.2", "6.4.3"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-emoji-release.min.js",
            "6f8769206add20ba15f249fb9f4978119774555c5500910fa8d899eeff11938e",
            &["6.5", "6.5.1", "6.5.2"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-auth-check.min.js",
            "a92ad92845e93d183c6d283630aba997982181a166178584b66686b99048c2ba",
            &["6.3", "6.3.1", "6.3.2", "6.4", "6.4.1", "6.4.2", "6.4.3"],
        ),
        JsFingerprint::new(
            "wp-includes/js/wp-auth-check.min.js",
            "59bf43b8431fa99cb69adac7ad220546e8acd250059352fe9d3ae64cb722e2f1",
            &["6.5", "6.5.1", "6.5.2"],
        ),
    ]
});

pub fn core_fingerprints() -> &'static [JsFingerprint] {
    &CORE_FINGERPRINTS
}

// ============================================================
// Plugin script version patterns
// ============================================================

/// Patterns applied to any plugin script when no dedicated entry exists
static GENERIC_SCRIPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"@version\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap(),
        Regex::new(r#"(?i)version['"]?\s*[:=]\s*['"]v?(\d+\.\d+(?:\.\d+)?)['"]"#).unwrap(),
        Regex::new(r"(?i)v(\d+\.\d+\.\d+)\b").unwrap(),
    ]
});

static PLUGIN_JS_PATTERNS: Lazy<Vec<PluginJsPattern>> = Lazy::new(|| {
    vec![
        PluginJsPattern {
            plugin: "contact-form-7".to_string(),
            paths: vec![
                "includes/js/index.js".to_string(),
                "includes/js/scripts.js".to_string(),
            ],
            version_patterns: vec![
                Regex::new(r#"wpcf7.*?version['"]?\s*[:=]\s*['"](\d+\.\d+(?:\.\d+)?)['"]"#)
                    .unwrap(),
                Regex::new(r"@version\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap(),
            ],
        },
        PluginJsPattern {
            plugin: "woocommerce".to_string(),
            paths: vec![
                "assets/js/frontend/woocommerce.min.js".to_string(),
                "assets/js/frontend/cart.min.js".to_string(),
            ],
            version_patterns: vec![
                Regex::new(r#"wc_version['"]?\s*[:=]\s*['"](\d+\.\d+(?:\.\d+)?)['"]"#).unwrap(),
                Regex::new(r"@version\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap(),
            ],
        },
        PluginJsPattern {
            plugin: "elementor".to_string(),
            paths: vec!["assets/js/frontend.min.js".to_string()],
            version_patterns: vec![
                Regex::new(r#"elementorFrontendConfig.*?version['"]?\s*[:=]\s*['"](\d+\.\d+(?:\.\d+)?)['"]"#)
                    .unwrap(),
            ],
        },
        PluginJsPattern {
            plugin: "jetpack".to_string(),
            paths: vec!["_inc/build/spin.min.js".to_string()],
            version_patterns: vec![
                Regex::new(r"@version\s+v?(\d+\.\d+(?:\.\d+)?)").unwrap(),
            ],
        },
    ]
});

pub fn plugin_js_pattern(slug: &str) -> Option<&'static PluginJsPattern> {
    PLUGIN_JS_PATTERNS.iter().find(|entry| entry.plugin == slug)
}

pub fn generic_script_patterns() -> &'static [Regex] {
    &GENERIC_SCRIPT_PATTERNS
}

/// Conventional script locations tried for plugins without a dedicated entry
pub fn default_plugin_script_paths(slug: &str) -> Vec<String> {
    vec![
        format!("{slug}.js"),
        format!("js/{slug}.js"),
        format!("assets/js/{slug}.min.js"),
    ]
}
