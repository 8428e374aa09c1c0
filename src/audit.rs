// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Misconfiguration Audit
 * Opportunistic checks for common WordPress exposure mistakes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, info};

use crate::http_client::FetchClient;
use crate::types::{AuditFinding, AuditReport, Severity};

type ProbeFn = for<'a> fn(&'a FetchClient, &'a str) -> BoxFuture<'a, Option<String>>;

/// One audit check: a stable tag, a severity, and a pure async probe
/// that returns evidence detail when the misconfiguration is confirmed.
pub struct MisconfigCheck {
    pub id: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub path: &'static str,
    probe: ProbeFn,
}

/// The closed list of checks, in reporting order
const CHECKS: &[MisconfigCheck] = &[
    MisconfigCheck {
        id: "xmlrpc-enabled",
        severity: Severity::Medium,
        description: "XML-RPC endpoint is enabled and accepts method calls, \
                      exposing credential brute-force amplification and pingback abuse",
        path: "/xmlrpc.php",
        probe: probe_xmlrpc,
    },
    MisconfigCheck {
        id: "user-enumeration",
        severity: Severity::Medium,
        description: "REST API exposes the user list to unauthenticated clients",
        path: "/wp-json/wp/v2/users",
        probe: probe_user_enumeration,
    },
    MisconfigCheck {
        id: "directory-listing",
        severity: Severity::Medium,
        description: "Uploads directory serves an automatic index of its contents",
        path: "/wp-content/uploads/",
        probe: probe_directory_listing,
    },
    MisconfigCheck {
        id: "config-backup",
        severity: Severity::Critical,
        description: "A configuration backup file is publicly readable, \
                      leaking database credentials",
        path: "/wp-config.php.bak",
        probe: probe_config_backup,
    },
    MisconfigCheck {
        id: "debug-log",
        severity: Severity::High,
        description: "Debug log file is publicly readable and leaks paths and diagnostics",
        path: "/wp-content/debug.log",
        probe: probe_debug_log,
    },
    MisconfigCheck {
        id: "install-accessible",
        severity: Severity::Medium,
        description: "Installation script still offers the setup wizard",
        path: "/wp-admin/install.php",
        probe: probe_install,
    },
];

pub fn checks() -> &'static [MisconfigCheck] {
    CHECKS
}

/// Run every check against the target. Probes run concurrently through
/// the shared fetch limiter; findings keep check-declaration order.
/// Transport failures are silent: these checks are opportunistic and
/// absence of a response is absence of evidence.
pub async fn run_audit(client: &FetchClient, base_url: &str) -> AuditReport {
    let base = base_url.trim_end_matches('/');
    let mut report = AuditReport::new(base);
    info!(target = %base, checks = CHECKS.len(), "Running misconfiguration audit");

    let outcomes = join_all(CHECKS.iter().map(|check| (check.probe)(client, base))).await;

    for (check, outcome) in CHECKS.iter().zip(outcomes) {
        if let Some(detail) = outcome {
            debug!(check = check.id, "Misconfiguration confirmed");
            report.findings.push(AuditFinding {
                id: format!("{}_{}", check.id, generate_id()),
                check: check.id.to_string(),
                severity: check.severity.clone(),
                description: check.description.to_string(),
                detail,
                url: format!("{base}{}", check.path),
            });
        }
    }

    info!(target = %base, findings = report.findings.len(), "Audit complete");
    report
}

fn generate_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!("{:08x}", rng.random::<u32>())
}

fn probe_xmlrpc<'a>(client: &'a FetchClient, base: &'a str) -> BoxFuture<'a, Option<String>> {
    async move {
        let url = format!("{base}/xmlrpc.php");
        let list_methods = r#"<?xml version="1.0"?><methodCall><methodName>system.listMethods</methodName></methodCall>"#;

        if let Some(response) = client.post(&url, list_methods.to_string(), "text/xml").await {
            if response.status_code == 200 && response.body.contains("<methodResponse") {
                return Some("xmlrpc.php answers system.listMethods".to_string());
            }
        }
        // Some hosts block POST at the proxy but the endpoint itself is live
        let response = client.fetch_response(&url).await?;
        if response.status_code == 405
            && response
                .body
                .contains("XML-RPC server accepts POST requests only")
        {
            return Some("xmlrpc.php advertises a POST-only XML-RPC endpoint".to_string());
        }
        None
    }
    .boxed()
}

fn probe_user_enumeration<'a>(
    client: &'a FetchClient,
    base: &'a str,
) -> BoxFuture<'a, Option<String>> {
    async move {
        let body = client.fetch(&format!("{base}/wp-json/wp/v2/users")).await?;
        if !body.trim_start().starts_with('[') || !body.contains("\"slug\"") {
            return None;
        }
        let count = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.as_array().map(|users| users.len()))
            .unwrap_or(0);
        Some(format!(
            "REST users endpoint exposes {count} account(s) with login slugs"
        ))
    }
    .boxed()
}

fn probe_directory_listing<'a>(
    client: &'a FetchClient,
    base: &'a str,
) -> BoxFuture<'a, Option<String>> {
    async move {
        let body = client.fetch(&format!("{base}/wp-content/uploads/")).await?;
        if body.contains("Index of /") || body.contains("<title>Index of") {
            return Some("wp-content/uploads/ returns an automatic directory index".to_string());
        }
        None
    }
    .boxed()
}

const CONFIG_BACKUP_FILES: &[&str] = &[
    "wp-config.php.bak",
    "wp-config.php~",
    "wp-config.php.save",
    "wp-config.old",
];

fn probe_config_backup<'a>(
    client: &'a FetchClient,
    base: &'a str,
) -> BoxFuture<'a, Option<String>> {
    async move {
        for file in CONFIG_BACKUP_FILES {
            let Some(body) = client.fetch(&format!("{base}/{file}")).await else {
                continue;
            };
            if body.contains("DB_NAME") {
                return Some(format!("{file} is served with database credentials visible"));
            }
        }
        None
    }
    .boxed()
}

fn probe_debug_log<'a>(client: &'a FetchClient, base: &'a str) -> BoxFuture<'a, Option<String>> {
    async move {
        let body = client.fetch(&format!("{base}/wp-content/debug.log")).await?;
        let leaking = body.contains("PHP Notice")
            || body.contains("PHP Warning")
            || body.contains("PHP Fatal error")
            || body.contains("PHP Deprecated");
        if leaking {
            return Some("wp-content/debug.log is world readable with PHP diagnostics".to_string());
        }
        None
    }
    .boxed()
}

fn probe_install<'a>(client: &'a FetchClient, base: &'a str) -> BoxFuture<'a, Option<String>> {
    async move {
        let response = client
            .fetch_response(&format!("{base}/wp-admin/install.php"))
            .await?;
        if !response.is_success() {
            return None;
        }
        let body = &response.body;
        let wizard = body.contains("Welcome to WordPress")
            || body.contains("installation process")
            || (body.contains("wp-core-ui") && !body.contains("Already Installed"));
        if wizard {
            return Some("wp-admin/install.php still renders the setup wizard".to_string());
        }
        None
    }
    .boxed()
}
