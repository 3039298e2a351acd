//! CLI argument parsing and query orchestration.
//!
//! This module is the entry point for the `skp` binary. It parses command-line
//! arguments via `clap`, loads the layered configuration, installs the
//! `tracing` subscriber, runs the key query over the passwd user source, and
//! invokes the selected reporter.
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | Query completed (zero rows included) |
//! | 2    | Fatal error (bad flags, config parse failure, report write failure) |

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::collectors::{collect_user_keys, PasswdUserSource};
use crate::config::{self, CliOverrides, ReportFormat, SkpConfig, Verbosity};
use crate::models::{QueryContext, Reporter, ScanMetadata, ScanResult};
use crate::reporting::{JsonReporter, TerminalReporter};
use crate::SkpError;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// The query ran to completion.
const EXIT_CLEAN: i32 = 0;
/// Fatal error before or after the query (config, flags, report output).
const EXIT_ERROR: i32 = 2;

// ---------------------------------------------------------------------------
// Clap argument definitions
// ---------------------------------------------------------------------------

/// SSH Key Probe - List private keys in users' ~/.ssh directories
#[derive(Parser)]
#[command(
    name = "skp",
    version,
    about = "SSH Key Probe - List private keys in users' ~/.ssh directories",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Scan flags applied when no subcommand is given (bare `skp` = `skp scan`).
    #[command(flatten)]
    scan_args: ScanArgs,
}

#[derive(Subcommand)]
enum Command {
    /// List private keys found in users' ~/.ssh directories
    Scan(ScanArgs),
    /// Create a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Clone, Default)]
struct ScanArgs {
    /// Only scan the user with this uid (repeatable)
    #[arg(short, long = "uid", value_name = "UID")]
    uids: Vec<String>,

    /// passwd file listing users and home directories [default: /etc/passwd]
    #[arg(long, value_name = "PATH")]
    passwd: Option<PathBuf>,

    /// Skip files larger than SIZE, e.g. 64KiB [default: 10MiB]
    #[arg(long, value_name = "SIZE")]
    max_file_size: Option<String>,

    /// Output format [terminal|json]
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Log skipped users and files to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Show only the summary line
    #[arg(short, long)]
    quiet: bool,

    /// Write report to file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl ScanArgs {
    /// Convert parsed CLI arguments into a `CliOverrides` struct.
    fn to_overrides(&self) -> Result<CliOverrides, SkpError> {
        let format = self
            .format
            .as_deref()
            .map(config::parse_format)
            .transpose()?;
        let max_file_size = self
            .max_file_size
            .as_deref()
            .map(config::parse_byte_size)
            .transpose()?;

        Ok(CliOverrides {
            format,
            verbose: self.verbose,
            quiet: self.quiet,
            output: self.output.clone(),
            passwd_path: self.passwd.clone(),
            max_file_size,
        })
    }

    fn query_context(&self) -> QueryContext {
        QueryContext::with_uids(self.uids.iter().cloned())
    }
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse CLI arguments and run the appropriate command. Returns an exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Init { force }) => run_init(force),
        Some(Command::Scan(args)) => run_scan(args),
        None => run_scan(cli.scan_args),
    }
}

// ---------------------------------------------------------------------------
// Init command
// ---------------------------------------------------------------------------

fn run_init(force: bool) -> i32 {
    match config::write_default_config(force) {
        Ok(path) => {
            println!("Config written to {}", path.display());
            EXIT_CLEAN
        }
        Err(e) => {
            eprintln!("skp error: {e}");
            EXIT_ERROR
        }
    }
}

// ---------------------------------------------------------------------------
// Scan orchestration
// ---------------------------------------------------------------------------

fn run_scan(args: ScanArgs) -> i32 {
    // 1. Convert CLI args to overrides.
    let overrides = match args.to_overrides() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("skp error: {e}");
            return EXIT_ERROR;
        }
    };

    // 2. Load config (fatal on error), then apply CLI overrides.
    let mut config = match SkpConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("skp error: {e}");
            return EXIT_ERROR;
        }
    };
    config.apply_overrides(&overrides);

    // 3. Logging follows the resolved verbosity.
    init_logging(&config.report.verbosity);

    // 4. Run the query. Scan-level failures are logged, never fatal.
    let context = args.query_context();
    let users = PasswdUserSource::new(&config.scan.passwd_path);
    let started_at = Utc::now();
    let scan = collect_user_keys(&context, &users, &config.scan);
    let completed_at = Utc::now();
    debug!(
        rows = scan.records.len(),
        users = scan.users_scanned,
        files = scan.files_read,
        "query complete"
    );

    let result = ScanResult {
        records: scan.records,
        scan_metadata: ScanMetadata {
            started_at,
            completed_at,
            users_scanned: scan.users_scanned,
            files_read: scan.files_read,
            skp_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    // 5. Report.
    let reporter: Box<dyn Reporter> = match config.report.format {
        ReportFormat::Terminal => Box::new(TerminalReporter),
        ReportFormat::Json => Box::new(JsonReporter),
    };

    if let Err(e) = reporter.report(&result, &config.report) {
        eprintln!("skp error: {} report failed: {e}", reporter.format_name());
        return EXIT_ERROR;
    }

    EXIT_CLEAN
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn default_log_level(verbosity: &Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "debug",
    }
}

/// Installs a stderr `tracing` subscriber. `RUST_LOG` takes precedence over
/// the verbosity-derived level.
fn init_logging(verbosity: &Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_args_default_produces_no_overrides() {
        let overrides = ScanArgs::default().to_overrides().unwrap();
        assert!(overrides.format.is_none());
        assert!(!overrides.verbose);
        assert!(!overrides.quiet);
        assert!(overrides.output.is_none());
        assert!(overrides.passwd_path.is_none());
        assert!(overrides.max_file_size.is_none());
    }

    #[test]
    fn scan_args_format_json_case_insensitive() {
        let args = ScanArgs {
            format: Some("JSON".to_string()),
            ..Default::default()
        };
        assert_eq!(args.to_overrides().unwrap().format, Some(ReportFormat::Json));
    }

    #[test]
    fn scan_args_format_invalid_returns_error() {
        let args = ScanArgs {
            format: Some("xml".to_string()),
            ..Default::default()
        };
        assert!(args.to_overrides().is_err());
    }

    #[test]
    fn scan_args_max_file_size_parsed() {
        let args = ScanArgs {
            max_file_size: Some("64KiB".to_string()),
            ..Default::default()
        };
        assert_eq!(args.to_overrides().unwrap().max_file_size, Some(65_536));
    }

    #[test]
    fn scan_args_max_file_size_invalid_returns_error() {
        let args = ScanArgs {
            max_file_size: Some("lots".to_string()),
            ..Default::default()
        };
        assert!(args.to_overrides().is_err());
    }

    #[test]
    fn scan_args_passwd_and_output_paths() {
        let args = ScanArgs {
            passwd: Some(PathBuf::from("/tmp/passwd")),
            output: Some(PathBuf::from("/tmp/keys.json")),
            ..Default::default()
        };
        let overrides = args.to_overrides().unwrap();
        assert_eq!(overrides.passwd_path, Some(PathBuf::from("/tmp/passwd")));
        assert_eq!(overrides.output, Some(PathBuf::from("/tmp/keys.json")));
    }

    #[test]
    fn uid_flags_become_query_constraints() {
        let cli = Cli::try_parse_from(["skp", "--uid", "1000", "-u", "0"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(
            cli.scan_args.query_context(),
            QueryContext::with_uids(["1000", "0"])
        );
    }

    #[test]
    fn no_uid_flags_means_all_users() {
        let cli = Cli::try_parse_from(["skp", "scan"]).unwrap();
        match cli.command {
            Some(Command::Scan(args)) => {
                assert!(!args.query_context().has_uid_constraints())
            }
            _ => panic!("expected scan subcommand"),
        }
    }

    #[test]
    fn init_subcommand_parses_force() {
        let cli = Cli::try_parse_from(["skp", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Init { force: true })));
    }

    #[test]
    fn log_level_follows_verbosity() {
        assert_eq!(default_log_level(&Verbosity::Quiet), "error");
        assert_eq!(default_log_level(&Verbosity::Normal), "warn");
        assert_eq!(default_log_level(&Verbosity::Verbose), "debug");
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_CLEAN, EXIT_ERROR);
    }
}
