// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Nuuskija - WordPress Component Inventory Scanner
 * Standalone CLI for inventory acquisition and CPE emission
 *
 * Features:
 * - Remote unauthenticated version detection
 * - wp-cli inventory parsing (file, stdin, or over ssh)
 * - CPE 2.3 identifier output for vulnerability correlation
 * - Opportunistic misconfiguration audit
 *
 * (c) 2026 Bountyy Oy
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, Level};

use nuuskija::audit;
use nuuskija::config::ScanOptions;
use nuuskija::errors::{ScanError, ScanResult};
use nuuskija::http_client::FetchClient;
use nuuskija::inventory;
use nuuskija::remote::RemoteScanner;
use nuuskija::shell::{CommandRunner, SshTarget, WpCliInventory};
use nuuskija::types::{AuditReport, DetectionResult};

/// Nuuskija - WordPress component inventory scanner
#[derive(Parser)]
#[command(name = "nuuskija")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.2.0")]
#[command(about = "WordPress component inventory with CPE 2.3 output", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a remote site over HTTP(S)
    Scan {
        /// Target host or URL
        target: String,

        /// Maximum concurrent requests
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout: u64,

        /// Retry attempts for transient failures
        #[arg(long, default_value = "2")]
        retries: u32,

        /// Custom User-Agent string
        #[arg(long)]
        user_agent: Option<String>,

        /// Disable core script fingerprinting
        #[arg(long)]
        no_fingerprint: bool,

        /// Also run the misconfiguration audit against the site
        #[arg(long)]
        audit: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a wp-cli style inventory document
    Inventory {
        /// Inventory file path, or - for stdin
        file: String,

        /// Target label recorded in the result
        #[arg(long, default_value = "local")]
        target: String,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Collect the inventory over ssh with wp-cli
    Shell {
        /// Destination as user@host[:port]
        destination: String,

        /// WordPress installation path on the remote host
        #[arg(long)]
        wp_path: Option<String>,

        /// ssh identity file
        #[arg(short, long)]
        identity: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run only the misconfiguration audit
    Audit {
        /// Target host or URL
        target: String,

        /// Maximum concurrent requests
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout: u64,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Cpe,
    Table,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("nuuskija-worker")
        .enable_all()
        .build()?;

    if let Err(err) = runtime.block_on(async_main(cli)) {
        error!("{err:#}");
        let code = err
            .downcast_ref::<ScanError>()
            .map(|scan_error| if scan_error.is_input_error() { 2 } else { 1 })
            .unwrap_or(1);
        std::process::exit(code);
    }
    Ok(())
}

async fn async_main(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            target,
            concurrency,
            timeout,
            retries,
            user_agent,
            no_fingerprint,
            audit,
            format,
            output,
        } => {
            let mut options = ScanOptions::default()
                .with_concurrency(concurrency)
                .with_timeout_ms(timeout)
                .with_retries(retries)
                .with_fingerprinting(!no_fingerprint);
            if let Some(agent) = user_agent {
                options = options.with_user_agent(&agent);
            }
            run_scan(&target, options, audit, format, output.as_deref()).await
        }
        Commands::Inventory {
            file,
            target,
            format,
            output,
        } => run_inventory(&file, &target, format, output.as_deref()),
        Commands::Shell {
            destination,
            wp_path,
            identity,
            format,
            output,
        } => run_shell(&destination, wp_path, identity, format, output.as_deref()).await,
        Commands::Audit {
            target,
            concurrency,
            timeout,
            format,
            output,
        } => {
            let options = ScanOptions::default()
                .with_concurrency(concurrency)
                .with_timeout_ms(timeout);
            run_audit_only(&target, options, format, output.as_deref()).await
        }
    }
}

async fn run_scan(
    target: &str,
    options: ScanOptions,
    with_audit: bool,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let scanner = RemoteScanner::new(options)?;
    let result = scanner.scan(target).await;
    info!(components = result.component_count(), "Scan finished");

    write_output(&render_result(&result, format)?, output)?;

    if with_audit {
        if let Some(site) = &result.site {
            let report = audit::run_audit(&scanner.client(), &site.url).await;
            println!("{}", render_audit(&report, format)?);
        } else {
            info!("Skipping audit: no reachable WordPress site");
        }
    }
    Ok(())
}

fn run_inventory(
    file: &str,
    target: &str,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let contents = if file == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading inventory from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading inventory file {file}"))?
    };

    let result = inventory::parse_inventory(&contents, target)?;
    write_output(&render_result(&result, format)?, output)
}

async fn run_shell(
    destination: &str,
    wp_path: Option<String>,
    identity: Option<PathBuf>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let target = SshTarget::parse(destination)?;
    let runner = ProcessRunner { target, identity };
    let mut collector = WpCliInventory::new(runner);
    if let Some(path) = wp_path {
        collector = collector.with_wp_path(path);
    }

    let result = collector.collect(destination).await?;
    write_output(&render_result(&result, format)?, output)
}

async fn run_audit_only(
    target: &str,
    options: ScanOptions,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let client = FetchClient::new(&options)?;
    let base = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{target}")
    };

    let report = audit::run_audit(&client, &base).await;
    write_output(&render_audit(&report, format)?, output)
}

/// Runs wp-cli on the remote host through the system ssh client
struct ProcessRunner {
    target: SshTarget,
    identity: Option<PathBuf>,
}

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &str) -> ScanResult<String> {
        let mut ssh = tokio::process::Command::new("ssh");
        ssh.arg("-p").arg(self.target.port.to_string());
        if let Some(identity) = &self.identity {
            ssh.arg("-i").arg(identity);
        }
        ssh.arg("-o")
            .arg("BatchMode=yes")
            .arg(self.target.destination())
            .arg(command);

        let output = ssh
            .output()
            .await
            .map_err(|err| ScanError::Shell(format!("failed to spawn ssh: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Shell(format!(
                "ssh command failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn render_result(result: &DetectionResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Cpe => {
            let lines: Vec<&str> = result
                .components()
                .iter()
                .map(|component| component.cpe.as_str())
                .collect();
            Ok(lines.join("\n"))
        }
        OutputFormat::Table => Ok(render_table(result)),
    }
}

fn render_table(result: &DetectionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Target: {}  (source: {})\n",
        result.target, result.source
    ));
    if let Some(site) = &result.site {
        out.push_str(&format!(
            "Site:   {}  server: {}\n",
            site.url,
            site.server.as_deref().unwrap_or("-")
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "{:<8} {:<28} {:<12} {:>4}  {}\n",
        "TYPE", "COMPONENT", "VERSION", "CONF", "CPE"
    ));
    for component in result.components() {
        out.push_str(&format!(
            "{:<8} {:<28} {:<12} {:>4}  {}\n",
            component.kind.as_str(),
            component.slug,
            component.version,
            component.confidence,
            component.cpe
        ));
    }
    for error in &result.errors {
        out.push_str(&format!("error: {error}\n"));
    }
    out
}

fn render_audit(report: &AuditReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut out = String::new();
            out.push_str(&format!("Audit: {}\n", report.target));
            for finding in &report.findings {
                out.push_str(&format!(
                    "[{}] {:<20} {}\n",
                    finding.severity, finding.check, finding.detail
                ));
            }
            if report.findings.is_empty() {
                out.push_str("No misconfigurations confirmed\n");
            }
            Ok(out)
        }
        _ => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn write_output(rendered: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Results written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
