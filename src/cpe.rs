// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CPE 2.3 Identifier Codec
 * Builds and parses CPE strings for vulnerability-database correlation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::refdata;
use crate::types::{ComponentKind, UNKNOWN_VERSION};

/// Decoded CPE fields relevant to component correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpeParts {
    pub vendor: String,
    pub product: String,
    pub version: String,
    pub target_sw: String,
}

/// Normalize a vendor or product identifier: lowercase, restrict to
/// `[a-z0-9._-]` with `_` standing in for everything else, collapse
/// repeated `_`, strip `_` from the edges. Idempotent.
pub fn normalize_identifier(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_underscore = false;
    for c in value.to_lowercase().chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.') {
            c
        } else {
            '_'
        };
        if mapped == '_' {
            if previous_underscore {
                continue;
            }
            previous_underscore = true;
        } else {
            previous_underscore = false;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        UNKNOWN_VERSION.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Escape the five CPE metacharacters in a version value, backslash first
/// so already-emitted escapes are never re-escaped. The sentinel `unknown`
/// and a bare `*` encode as the unescaped wildcard.
fn escape_version(version: &str) -> String {
    if version == UNKNOWN_VERSION || version == "*" {
        return "*".to_string();
    }
    version
        .replace('\\', "\\\\")
        .replace('*', "\\*")
        .replace('?', "\\?")
        .replace('"', "\\\"")
        .replace(':', "\\:")
}

/// Invert [`escape_version`]. A literal `*` field decodes to the sentinel.
fn unescape_field(field: &str) -> String {
    if field == "*" {
        return UNKNOWN_VERSION.to_string();
    }
    field
        .replace("\\:", ":")
        .replace("\\\"", "\"")
        .replace("\\?", "?")
        .replace("\\*", "*")
        .replace("\\\\", "\\")
}

/// Split a CPE string on `:` while honoring backslash escapes inside fields
fn split_fields(value: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Build a CPE 2.3 application identifier. Plugins and themes carry
/// `wordpress` in the target-software field; core carries the wildcard.
pub fn encode(vendor: &str, product: &str, version: &str, is_plugin: bool) -> String {
    let target_sw = if is_plugin { "wordpress" } else { "*" };
    format!(
        "cpe:2.3:a:{}:{}:{}:*:*:*:*:{}:*:*",
        normalize_identifier(vendor),
        normalize_identifier(product),
        escape_version(version),
        target_sw
    )
}

/// Parse a CPE 2.3 application identifier. Anything that does not match the
/// thirteen-field `cpe:2.3:a:` grammar yields `None`, never an error.
pub fn decode(value: &str) -> Option<CpeParts> {
    let fields = split_fields(value);
    if fields.len() != 13 {
        return None;
    }
    if fields[0] != "cpe" || fields[1] != "2.3" || fields[2] != "a" {
        return None;
    }
    Some(CpeParts {
        vendor: unescape_field(&fields[3]),
        product: unescape_field(&fields[4]),
        version: unescape_field(&fields[5]),
        target_sw: fields[10].clone(),
    })
}

/// Resolve the CPE vendor for a component slug: exact table match first,
/// then the first dash-segment when it names a known vendor, then the slug
/// itself. The prefix step is heuristic and deliberately not extended past
/// the first segment.
pub fn vendor_for_slug(slug: &str) -> String {
    let slug = slug.to_lowercase();
    if let Some(vendor) = refdata::known_vendor(&slug) {
        return vendor.to_string();
    }
    if let Some(prefix) = slug.split('-').next() {
        if prefix != slug && refdata::is_known_vendor_name(prefix) {
            return prefix.to_string();
        }
    }
    slug
}

/// Derive the CPE for an inventoried component. Core is always
/// `wordpress:wordpress`; plugins and themes resolve their vendor through
/// the reference table.
pub fn component_cpe(kind: ComponentKind, slug: &str, version: &str) -> String {
    match kind {
        ComponentKind::Core => encode("wordpress", "wordpress", version, false),
        ComponentKind::Plugin | ComponentKind::Theme => {
            encode(&vendor_for_slug(slug), slug, version, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_core() {
        assert_eq!(
            encode("wordpress", "wordpress", "6.4.2", false),
            "cpe:2.3:a:wordpress:wordpress:6.4.2:*:*:*:*:*:*:*"
        );
    }

    #[test]
    fn test_encode_plugin() {
        assert_eq!(
            encode("rocklobster", "contact-form-7", "5.8.1", true),
            "cpe:2.3:a:rocklobster:contact-form-7:5.8.1:*:*:*:*:wordpress:*:*"
        );
    }

    #[test]
    fn test_encode_unknown_version_as_wildcard() {
        let cpe = encode("automattic", "akismet", "unknown", true);
        assert_eq!(cpe, "cpe:2.3:a:automattic:akismet:*:*:*:*:*:wordpress:*:*");
        let parts = decode(&cpe).unwrap();
        assert_eq!(parts.version, "unknown");
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("Rock Lobster, LLC"), "rock_lobster_llc");
        assert_eq!(normalize_identifier("__Weird__Vendor__"), "weird_vendor");
        assert_eq!(normalize_identifier("!!!"), "unknown");
        assert_eq!(normalize_identifier(""), "unknown");
        assert_eq!(normalize_identifier("already-clean.name"), "already-clean.name");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["Rock Lobster, LLC", "a  b", "ÜMLAUT vendor", "--x--"] {
            let once = normalize_identifier(raw);
            assert_eq!(normalize_identifier(&once), once);
        }
    }

    #[test]
    fn test_version_round_trip_with_metacharacters() {
        for version in [
            "6.4.2",
            "1.0:beta",
            "2*",
            "what?",
            "say\"hi\"",
            "back\\slash",
            "\\:",
            "mix\\*all?of:them\"",
        ] {
            let cpe = encode("vendor", "product", version, true);
            let parts = decode(&cpe).expect("generated CPE must decode");
            assert_eq!(parts.version, version, "round-trip failed for {version:?}");
        }
    }

    #[test]
    fn test_decode_rejects_bad_grammar() {
        assert!(decode("").is_none());
        assert!(decode("cpe:2.3:a:too:few:fields").is_none());
        assert!(decode("cpe:2.2:a:v:p:1:*:*:*:*:*:*:*").is_none());
        assert!(decode("cpe:2.3:o:v:p:1:*:*:*:*:*:*:*").is_none());
        assert!(decode("not a cpe at all").is_none());
        // 14 fields
        assert!(decode("cpe:2.3:a:v:p:1:*:*:*:*:*:*:*:*").is_none());
    }

    #[test]
    fn test_decode_target_sw() {
        let core = decode("cpe:2.3:a:wordpress:wordpress:6.4.2:*:*:*:*:*:*:*").unwrap();
        assert_eq!(core.target_sw, "*");
        let plugin = decode("cpe:2.3:a:automattic:akismet:5.3:*:*:*:*:wordpress:*:*").unwrap();
        assert_eq!(plugin.target_sw, "wordpress");
    }

    #[test]
    fn test_vendor_for_slug() {
        assert_eq!(vendor_for_slug("contact-form-7"), "rocklobster");
        assert_eq!(vendor_for_slug("jetpack-boost"), "jetpack");
        assert_eq!(vendor_for_slug("some-unknown-plugin"), "some-unknown-plugin");
        assert_eq!(vendor_for_slug("jetpack"), "automattic");
    }

    #[test]
    fn test_component_cpe() {
        assert_eq!(
            component_cpe(ComponentKind::Core, "wordpress", "6.4.2"),
            "cpe:2.3:a:wordpress:wordpress:6.4.2:*:*:*:*:*:*:*"
        );
        assert_eq!(
            component_cpe(ComponentKind::Plugin, "contact-form-7", "5.8.1"),
            "cpe:2.3:a:rocklobster:contact-form-7:5.8.1:*:*:*:*:wordpress:*:*"
        );
        assert_eq!(
            component_cpe(ComponentKind::Theme, "astra", "4.6.0"),
            "cpe:2.3:a:brainstormforce:astra:4.6.0:*:*:*:*:wordpress:*:*"
        );
    }
}
