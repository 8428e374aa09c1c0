// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CPE Codec Tests
 * Identifier grammar, normalization, and round-trip behavior
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use nuuskija::cpe::{component_cpe, decode, encode, normalize_identifier, vendor_for_slug};
use nuuskija::types::ComponentKind;

#[test]
fn test_identifier_has_thirteen_fields() {
    let cpe = encode("yoast", "wordpress-seo", "21.7", true);
    assert_eq!(cpe, "cpe:2.3:a:yoast:wordpress-seo:21.7:*:*:*:*:wordpress:*:*");
    // Unescaped colons delimit exactly 13 fields
    assert_eq!(cpe.split(':').count(), 13);
}

#[test]
fn test_core_target_software_is_wildcard() {
    let cpe = component_cpe(ComponentKind::Core, "wordpress", "6.4.2");
    assert_eq!(cpe, "cpe:2.3:a:wordpress:wordpress:6.4.2:*:*:*:*:*:*:*");
}

#[test]
fn test_plugin_and_theme_target_software() {
    let plugin = component_cpe(ComponentKind::Plugin, "akismet", "5.3");
    assert!(plugin.ends_with(":wordpress:*:*"));
    let theme = component_cpe(ComponentKind::Theme, "astra", "4.5.2");
    assert!(theme.ends_with(":wordpress:*:*"));
    assert_eq!(theme, "cpe:2.3:a:brainstormforce:astra:4.5.2:*:*:*:*:wordpress:*:*");
}

#[test]
fn test_unknown_version_encodes_as_wildcard() {
    let cpe = component_cpe(ComponentKind::Plugin, "mystery-plugin", "unknown");
    assert_eq!(
        cpe,
        "cpe:2.3:a:mystery-plugin:mystery-plugin:*:*:*:*:*:wordpress:*:*"
    );
    let parts = decode(&cpe).unwrap();
    assert_eq!(parts.version, "unknown");
}

#[test]
fn test_normalization_rules() {
    // Uppercase folds, illegal characters collapse to single underscores,
    // edge underscores are stripped, empty input becomes "unknown"
    assert_eq!(normalize_identifier("Contact Form 7"), "contact_form_7");
    assert_eq!(normalize_identifier("weird!!name"), "weird_name");
    assert_eq!(normalize_identifier("__edge__"), "edge");
    assert_eq!(normalize_identifier(""), "unknown");
    assert_eq!(normalize_identifier("!!!"), "unknown");
    assert_eq!(normalize_identifier("dots.and-dashes_ok"), "dots.and-dashes_ok");
}

#[test]
fn test_version_escaping_round_trips() {
    let awkward_versions = [
        "6.4.2",
        "1.0:beta",
        "2*",
        "what?",
        "say\"hi\"",
        "back\\slash",
        "\\:",
        "mix\\*all?of:them\"",
    ];
    for version in awkward_versions {
        let cpe = encode("vendor", "product", version, true);
        let parts = decode(&cpe).unwrap_or_else(|| panic!("decode failed for {version}"));
        assert_eq!(parts.version, version, "round trip failed for {version}");
        assert_eq!(parts.vendor, "vendor");
        assert_eq!(parts.product, "product");
    }
}

#[test]
fn test_escaped_colon_does_not_split_fields() {
    let cpe = encode("vendor", "product", "1.0:beta", true);
    let parts = decode(&cpe).unwrap();
    assert_eq!(parts.version, "1.0:beta");
    assert_eq!(parts.target_sw, "wordpress");
}

#[test]
fn test_decode_rejects_bad_grammar() {
    assert!(decode("").is_none());
    assert!(decode("cpe:2.3:a:too:few:fields").is_none());
    assert!(decode("cpe:2.2:a:v:p:1:*:*:*:*:*:*:*").is_none());
    assert!(decode("cpe:2.3:o:v:p:1:*:*:*:*:*:*:*").is_none());
    assert!(decode("not-a-cpe-at-all").is_none());
    // 14 fields is as invalid as 12
    assert!(decode("cpe:2.3:a:v:p:1:*:*:*:*:*:*:*:extra").is_none());
}

#[test]
fn test_vendor_table_and_prefix_inference() {
    // Table-pinned vendors
    assert_eq!(vendor_for_slug("contact-form-7"), "rocklobster");
    assert_eq!(vendor_for_slug("akismet"), "automattic");
    assert_eq!(vendor_for_slug("wordpress-seo"), "yoast");
    // Prefix inference for slugs sharing a known vendor name
    assert_eq!(vendor_for_slug("jetpack-boost"), "jetpack");
    // Unrelated slugs fall back to themselves
    assert_eq!(vendor_for_slug("my-custom-widget"), "my-custom-widget");
    // Case folds before lookup
    assert_eq!(vendor_for_slug("AKISMET"), "automattic");
}

#[test]
fn test_component_cpe_normalizes_slug_for_product() {
    let cpe = component_cpe(ComponentKind::Plugin, "My Plugin!", "1.0");
    assert_eq!(cpe, "cpe:2.3:a:my_plugin:my_plugin:1.0:*:*:*:*:wordpress:*:*");
}
