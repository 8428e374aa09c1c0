// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Inventory Document Parsing
 * Turns wp-cli style JSON inventories into detection results
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{ScanError, ScanResult};
use crate::types::{
    ComponentKind, DetectedComponent, DetectionResult, DetectionSource, UNKNOWN_VERSION,
};

/// Inventory data comes from the installation itself
pub const INVENTORY_CONFIDENCE: u8 = 100;

/// One plugin-or-theme record as emitted by wp-cli `--format=json` and
/// compatible management tools. Unknown fields are tolerated and dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRecord {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub update: Option<String>,
    #[serde(default)]
    pub auto_update: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Parse one inventory document. Accepted shapes: a bare record array
/// (classified as plugins), an object `{core?, plugins?, themes?}`, or
/// NDJSON where each non-empty line is one of the former. A malformed
/// single-document input is an input error; malformed NDJSON lines are
/// recorded per line and do not abort later lines.
pub fn parse_inventory(input: &str, target: &str) -> ScanResult<DetectionResult> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidInput("empty inventory document".to_string()));
    }

    let mut result = DetectionResult::new(target, DetectionSource::WpCli);

    match serde_json::from_str::<Value>(trimmed) {
        Ok(document) => apply_fragment(&document, &mut result)?,
        Err(parse_error) => {
            let lines: Vec<(usize, &str)> = trimmed
                .lines()
                .enumerate()
                .map(|(index, line)| (index + 1, line.trim()))
                .filter(|(_, line)| !line.is_empty())
                .collect();
            if lines.len() < 2 {
                return Err(ScanError::InvalidInput(format!(
                    "malformed inventory JSON: {parse_error}"
                )));
            }
            debug!(lines = lines.len(), "Parsing inventory as NDJSON");
            for (line_number, line) in lines {
                match serde_json::from_str::<Value>(line) {
                    Ok(fragment) => {
                        if let Err(error) = apply_fragment(&fragment, &mut result) {
                            result.errors.push(format!("line {line_number}: {error}"));
                        }
                    }
                    Err(error) => {
                        warn!(line = line_number, "Skipping malformed inventory line");
                        result.errors.push(format!("line {line_number}: {error}"));
                    }
                }
            }
        }
    }

    Ok(result)
}

/// Read an inventory document from disk and parse it
pub fn parse_inventory_file(path: &Path, target: &str) -> ScanResult<DetectionResult> {
    let contents = std::fs::read_to_string(path)?;
    parse_inventory(&contents, target)
}

/// Parse a bare wp-cli record array into components of one kind
pub fn parse_record_array(input: &str, kind: ComponentKind) -> ScanResult<Vec<DetectedComponent>> {
    let records: Vec<InventoryRecord> = serde_json::from_str(input.trim())
        .map_err(|error| ScanError::InvalidInput(format!("malformed wp-cli JSON: {error}")))?;
    Ok(records
        .iter()
        .map(|record| record_component(record, kind))
        .collect())
}

fn apply_fragment(document: &Value, result: &mut DetectionResult) -> ScanResult<()> {
    match document {
        // Bare arrays carry no kind marker; classify as plugins
        Value::Array(records) => {
            for record in records {
                result
                    .plugins
                    .push(record_component(&parse_record(record)?, ComponentKind::Plugin));
            }
            Ok(())
        }
        Value::Object(map) => {
            if let Some(core) = map.get("core") {
                let version = match core {
                    Value::String(version) => Some(version.clone()),
                    Value::Object(inner) => inner
                        .get("version")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                };
                match version {
                    // Last fragment wins when NDJSON repeats core
                    Some(version) => result.core = Some(core_component(&version)),
                    None => {
                        return Err(ScanError::InvalidInput(
                            "core entry carries no version".to_string(),
                        ))
                    }
                }
            }
            if let Some(plugins) = map.get("plugins") {
                for record in expect_array(plugins, "plugins")? {
                    result
                        .plugins
                        .push(record_component(&parse_record(record)?, ComponentKind::Plugin));
                }
            }
            if let Some(themes) = map.get("themes") {
                for record in expect_array(themes, "themes")? {
                    result
                        .themes
                        .push(record_component(&parse_record(record)?, ComponentKind::Theme));
                }
            }
            Ok(())
        }
        _ => Err(ScanError::InvalidInput(
            "inventory document must be a JSON array or object".to_string(),
        )),
    }
}

fn expect_array<'a>(value: &'a Value, field: &str) -> ScanResult<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        ScanError::InvalidInput(format!("inventory field '{field}' must be a JSON array"))
    })
}

fn parse_record(value: &Value) -> ScanResult<InventoryRecord> {
    serde_json::from_value(value.clone())
        .map_err(|error| ScanError::InvalidInput(format!("invalid inventory record: {error}")))
}

fn record_component(record: &InventoryRecord, kind: ComponentKind) -> DetectedComponent {
    let slug = record
        .slug
        .clone()
        .unwrap_or_else(|| derive_slug(&record.name));
    let name = record.title.clone().unwrap_or_else(|| record.name.clone());
    let version = record
        .version
        .clone()
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
    DetectedComponent::new(
        kind,
        &slug,
        &name,
        &version,
        INVENTORY_CONFIDENCE,
        DetectionSource::WpCli,
    )
    .with_status(record.status.clone())
    .with_update(record.update.clone(), record.auto_update.clone())
}

fn core_component(version: &str) -> DetectedComponent {
    DetectedComponent::new(
        ComponentKind::Core,
        "wordpress",
        "WordPress",
        version,
        INVENTORY_CONFIDENCE,
        DetectionSource::WpCli,
    )
}

/// Slug from a display name: lowercase, non-alphanumeric runs collapse
/// to a single dash, dashes trimmed from both ends
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array_becomes_plugins() {
        let result =
            parse_inventory(r#"[{"name":"x","version":"1.0","status":"active"}]"#, "site")
                .unwrap();
        assert!(result.core.is_none());
        assert_eq!(result.plugins.len(), 1);
        assert!(result.themes.is_empty());
        assert!(result.errors.is_empty());
        let plugin = &result.plugins[0];
        assert_eq!(plugin.name, "x");
        assert_eq!(plugin.slug, "x");
        assert_eq!(plugin.version, "1.0");
        assert_eq!(plugin.confidence, 100);
        assert_eq!(plugin.status.as_deref(), Some("active"));
        assert_eq!(plugin.cpe, "cpe:2.3:a:x:x:1.0:*:*:*:*:wordpress:*:*");
    }

    #[test]
    fn test_object_shape_with_core_string() {
        let input = r#"{
            "core": "6.4.2",
            "plugins": [{"name":"akismet","version":"5.3","status":"active"}],
            "themes": [{"name":"twentytwentyfour","version":"1.0","status":"active"}]
        }"#;
        let result = parse_inventory(input, "site").unwrap();
        let core = result.core.unwrap();
        assert_eq!(core.version, "6.4.2");
        assert_eq!(core.cpe, "cpe:2.3:a:wordpress:wordpress:6.4.2:*:*:*:*:*:*:*");
        assert_eq!(result.plugins.len(), 1);
        assert_eq!(result.themes.len(), 1);
        assert_eq!(result.themes[0].kind, ComponentKind::Theme);
    }

    #[test]
    fn test_core_object_with_version_field() {
        let result = parse_inventory(r#"{"core": {"version": "6.3"}}"#, "site").unwrap();
        assert_eq!(result.core.unwrap().version, "6.3");
    }

    #[test]
    fn test_missing_version_uses_sentinel() {
        let result = parse_inventory(r#"[{"name":"mystery","status":"inactive"}]"#, "site")
            .unwrap();
        let plugin = &result.plugins[0];
        assert_eq!(plugin.version, UNKNOWN_VERSION);
        assert!(plugin.cpe.contains(":mystery:*:"));
    }

    #[test]
    fn test_explicit_slug_overrides_derivation() {
        let result = parse_inventory(
            r#"[{"name":"Contact Form 7","slug":"contact-form-7","version":"5.8.1"}]"#,
            "site",
        )
        .unwrap();
        let plugin = &result.plugins[0];
        assert_eq!(plugin.slug, "contact-form-7");
        assert_eq!(plugin.name, "Contact Form 7");
        assert_eq!(
            plugin.cpe,
            "cpe:2.3:a:rocklobster:contact-form-7:5.8.1:*:*:*:*:wordpress:*:*"
        );
    }

    #[test]
    fn test_title_preferred_for_display_name() {
        let result = parse_inventory(
            r#"[{"name":"akismet","title":"Akismet Anti-spam","version":"5.3"}]"#,
            "site",
        )
        .unwrap();
        assert_eq!(result.plugins[0].name, "Akismet Anti-spam");
        assert_eq!(result.plugins[0].slug, "akismet");
    }

    #[test]
    fn test_ndjson_records_bad_line_and_continues() {
        let input = "{\"core\": \"6.4\"}\nnot json at all\n[{\"name\":\"jetpack\",\"version\":\"12.8\"}]";
        let result = parse_inventory(input, "site").unwrap();
        assert_eq!(result.core.unwrap().version, "6.4");
        assert_eq!(result.plugins.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("line 2:"));
    }

    #[test]
    fn test_ndjson_core_last_wins() {
        let input = "{\"core\": \"6.3\"}\n{\"core\": \"6.4.2\"}";
        let result = parse_inventory(input, "site").unwrap();
        assert_eq!(result.core.unwrap().version, "6.4.2");
    }

    #[test]
    fn test_single_document_malformed_is_input_error() {
        let error = parse_inventory("{broken", "site").unwrap_err();
        assert!(error.is_input_error());
        assert!(error.to_string().contains("malformed inventory JSON"));
    }

    #[test]
    fn test_empty_input_is_input_error() {
        assert!(parse_inventory("  \n ", "site").unwrap_err().is_input_error());
    }

    #[test]
    fn test_scalar_document_rejected() {
        assert!(parse_inventory("42", "site").is_err());
    }

    #[test]
    fn test_derive_slug() {
        assert_eq!(derive_slug("Contact Form 7"), "contact-form-7");
        assert_eq!(derive_slug("WP Super Cache!"), "wp-super-cache");
        assert_eq!(derive_slug("--edge--"), "edge");
        assert_eq!(derive_slug("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn test_result_source_is_wp_cli() {
        let result = parse_inventory("[]", "site").unwrap();
        assert_eq!(result.source, DetectionSource::WpCli);
        assert_eq!(result.target, "site");
    }
}
