// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

use crate::cpe;

/// Version string reported when a component is confirmed present but its
/// exact release could not be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Kind of inventoried WordPress component
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Core,
    Plugin,
    Theme,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Core => "core",
            ComponentKind::Plugin => "plugin",
            ComponentKind::Theme => "theme",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance of an inventory entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    #[serde(rename = "wp-cli")]
    WpCli,
    Remote,
    Local,
}

impl DetectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionSource::WpCli => "wp-cli",
            DetectionSource::Remote => "remote",
            DetectionSource::Local => "local",
        }
    }
}

impl std::fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One inventoried component. The `cpe` field is a cached projection of
/// `(kind, slug, version)` and is always rebuilt through the codec, never
/// edited by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedComponent {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub slug: String,
    pub name: String,
    pub version: String,
    pub confidence: u8,
    pub cpe: String,
    pub source: DetectionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<String>,
}

impl DetectedComponent {
    pub fn new(
        kind: ComponentKind,
        slug: &str,
        name: &str,
        version: &str,
        confidence: u8,
        source: DetectionSource,
    ) -> Self {
        Self {
            kind,
            slug: slug.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            confidence,
            cpe: cpe::component_cpe(kind, slug, version),
            source,
            status: None,
            update: None,
            auto_update: None,
        }
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn with_update(mut self, update: Option<String>, auto_update: Option<String>) -> Self {
        self.update = update;
        self.auto_update = auto_update;
        self
    }
}

/// Metadata about the scanned site gathered during scheme negotiation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMeta {
    pub url: String,
    pub scheme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// Final output of one inventory run, regardless of acquisition strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub target: String,
    pub timestamp: String,
    pub source: DetectionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<DetectedComponent>,
    pub plugins: Vec<DetectedComponent>,
    pub themes: Vec<DetectedComponent>,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteMeta>,
}

impl DetectionResult {
    pub fn new(target: &str, source: DetectionSource) -> Self {
        Self {
            target: target.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source,
            core: None,
            plugins: Vec::new(),
            themes: Vec::new(),
            errors: Vec::new(),
            site: None,
        }
    }

    /// Total number of inventoried components including core
    pub fn component_count(&self) -> usize {
        self.plugins.len() + self.themes.len() + usize::from(self.core.is_some())
    }

    /// All components in stable output order: core, plugins, themes
    pub fn components(&self) -> Vec<&DetectedComponent> {
        let mut all = Vec::with_capacity(self.component_count());
        if let Some(core) = &self.core {
            all.push(core);
        }
        all.extend(self.plugins.iter());
        all.extend(self.themes.iter());
        all
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// One confirmed misconfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFinding {
    pub id: String,
    pub check: String,
    pub severity: Severity,
    pub description: String,
    pub detail: String,
    pub url: String,
}

/// Output of the misconfiguration audit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub target: String,
    pub timestamp: String,
    pub findings: Vec<AuditFinding>,
    pub errors: Vec<String>,
}

impl AuditReport {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            findings: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Derive a human-readable display name from a slug, e.g.
/// `contact-form-7` -> `Contact Form 7`
pub fn title_case_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_slug() {
        assert_eq!(title_case_slug("contact-form-7"), "Contact Form 7");
        assert_eq!(title_case_slug("akismet"), "Akismet");
        assert_eq!(title_case_slug("wp_super_cache"), "Wp Super Cache");
    }

    #[test]
    fn test_component_serialization_shape() {
        let component = DetectedComponent::new(
            ComponentKind::Plugin,
            "akismet",
            "Akismet",
            "5.3",
            100,
            DetectionSource::WpCli,
        );
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["type"], "plugin");
        assert_eq!(json["source"], "wp-cli");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_component_count() {
        let mut result = DetectionResult::new("https://example.com", DetectionSource::Remote);
        assert_eq!(result.component_count(), 0);
        result.core = Some(DetectedComponent::new(
            ComponentKind::Core,
            "wordpress",
            "WordPress",
            "6.4.2",
            95,
            DetectionSource::Remote,
        ));
        result.plugins.push(DetectedComponent::new(
            ComponentKind::Plugin,
            "akismet",
            "Akismet",
            "unknown",
            60,
            DetectionSource::Remote,
        ));
        assert_eq!(result.component_count(), 2);
        assert_eq!(result.components().len(), 2);
    }
}
