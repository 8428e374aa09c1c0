// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Remote Shell Inventory
 * Collects component inventories over an injected command runner
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{ScanError, ScanResult};
use crate::inventory::{self, INVENTORY_CONFIDENCE};
use crate::types::{ComponentKind, DetectedComponent, DetectionResult, DetectionSource};

/// Run a command on the target host and capture its stdout. The library
/// never spawns processes itself; execution plumbing is injected.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> ScanResult<String>;
}

/// Parsed `user@host[:port]` destination descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl SshTarget {
    pub fn parse(descriptor: &str) -> ScanResult<Self> {
        let trimmed = descriptor.trim();
        let (user, host_part) = trimmed.split_once('@').ok_or_else(|| {
            ScanError::InvalidTarget(format!(
                "expected user@host[:port], got '{descriptor}'"
            ))
        })?;
        if user.is_empty() {
            return Err(ScanError::InvalidTarget(format!(
                "missing user in '{descriptor}'"
            )));
        }
        let (host, port) = match host_part.rsplit_once(':') {
            Some((host, port_text)) => {
                let port = port_text.parse::<u16>().map_err(|_| {
                    ScanError::InvalidTarget(format!("invalid port '{port_text}'"))
                })?;
                if port == 0 {
                    return Err(ScanError::InvalidTarget(
                        "port 0 is not a valid ssh port".to_string(),
                    ));
                }
                (host, port)
            }
            None => (host_part, 22),
        };
        if host.is_empty() {
            return Err(ScanError::InvalidTarget(format!(
                "missing host in '{descriptor}'"
            )));
        }
        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
            port,
        })
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl std::fmt::Display for SshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

fn is_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "_@%+=:,./-".contains(ch)
}

/// Quote a value for a POSIX shell command line. Values made only of
/// safe characters pass through; everything else is single-quoted with
/// embedded single quotes escaped as `'"'"'`.
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_safe_char) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// wp-cli based inventory collection over a [`CommandRunner`]
pub struct WpCliInventory<R: CommandRunner> {
    runner: R,
    wp_path: Option<String>,
}

impl<R: CommandRunner> WpCliInventory<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            wp_path: None,
        }
    }

    /// Point wp-cli at an explicit WordPress installation directory
    pub fn with_wp_path(mut self, path: impl Into<String>) -> Self {
        self.wp_path = Some(path.into());
        self
    }

    fn command(&self, base: &str) -> String {
        match &self.wp_path {
            Some(path) => format!("{base} --path={}", shell_quote(path)),
            None => base.to_string(),
        }
    }

    /// Run the three wp-cli inventory commands and assemble a result.
    /// A failed core-version command degrades to a result error entry;
    /// only all three commands failing makes the collection itself fail.
    pub async fn collect(&self, target_label: &str) -> ScanResult<DetectionResult> {
        let mut result = DetectionResult::new(target_label, DetectionSource::WpCli);
        let mut command_failures = 0usize;

        let core_command = self.command("wp core version --skip-plugins --skip-themes");
        debug!(command = %core_command, "Running wp-cli core version");
        match self.runner.run(&core_command).await {
            Ok(output) => match extract_core_version(&output) {
                Some(version) => {
                    result.core = Some(DetectedComponent::new(
                        ComponentKind::Core,
                        "wordpress",
                        "WordPress",
                        &version,
                        INVENTORY_CONFIDENCE,
                        DetectionSource::WpCli,
                    ));
                }
                None => {
                    result
                        .errors
                        .push("wp core version returned no usable output".to_string());
                }
            },
            Err(error) => {
                warn!(error = %error, "wp-cli core version failed");
                result
                    .errors
                    .push(format!("core version lookup failed: {error}"));
                command_failures += 1;
            }
        }

        let plugin_command = self.command("wp plugin list --format=json");
        debug!(command = %plugin_command, "Running wp-cli plugin list");
        match self.runner.run(&plugin_command).await {
            Ok(output) => {
                result.plugins = inventory::parse_record_array(&output, ComponentKind::Plugin)?;
            }
            Err(error) => {
                warn!(error = %error, "wp-cli plugin list failed");
                result.errors.push(format!("plugin list failed: {error}"));
                command_failures += 1;
            }
        }

        let theme_command = self.command("wp theme list --format=json");
        debug!(command = %theme_command, "Running wp-cli theme list");
        match self.runner.run(&theme_command).await {
            Ok(output) => {
                result.themes = inventory::parse_record_array(&output, ComponentKind::Theme)?;
            }
            Err(error) => {
                warn!(error = %error, "wp-cli theme list failed");
                result.errors.push(format!("theme list failed: {error}"));
                command_failures += 1;
            }
        }

        if command_failures == 3 {
            return Err(ScanError::Shell(
                "all wp-cli commands failed against target".to_string(),
            ));
        }
        Ok(result)
    }
}

/// wp-cli prints the bare version on its own line; PHP notices that leak
/// onto stdout come before it, so the last version-shaped line wins
fn extract_core_version(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && line.chars().next().is_some_and(|ch| ch.is_ascii_digit())
        })
        .last()
        .map(str::to_string)
}
