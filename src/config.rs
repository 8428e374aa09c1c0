// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Configuration
 * Immutable per-invocation options shared across all concurrent probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Nuuskija/1.2; +https://bountyy.fi)";

/// Options fixed at the start of a scan. Never mutated afterwards; shared by
/// reference across every concurrent fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// Per-attempt fetch timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum simultaneous in-flight fetches
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Additional attempts after the first failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay for exponential retry backoff in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether script-content fingerprinting may run when no explicit
    /// version marker is found
    #[serde(default = "default_fingerprint_enabled")]
    pub fingerprint_enabled: bool,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_concurrency() -> usize {
    8
}

fn default_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_fingerprint_enabled() -> bool {
    true
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
            retries: default_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            user_agent: default_user_agent(),
            fingerprint_enabled: default_fingerprint_enabled(),
        }
    }
}

impl ScanOptions {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 256);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.min(10);
        self
    }

    pub fn with_retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        if !user_agent.trim().is_empty() {
            self.user_agent = user_agent.to_string();
        }
        self
    }

    pub fn with_fingerprinting(mut self, enabled: bool) -> Self {
        self.fingerprint_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.concurrency, 8);
        assert_eq!(options.retries, 2);
        assert!(options.fingerprint_enabled);
    }

    #[test]
    fn test_builder_clamps() {
        let options = ScanOptions::default()
            .with_concurrency(0)
            .with_timeout_ms(0)
            .with_retries(99);
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.timeout_ms, 1);
        assert_eq!(options.retries, 10);
    }

    #[test]
    fn test_deserialize_with_partial_fields() {
        let options: ScanOptions = serde_json::from_str(r#"{"concurrency": 3}"#).unwrap();
        assert_eq!(options.concurrency, 3);
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    }
}
