//! ANSI-colored terminal reporter.
//!
//! Prints one line per key row followed by a summary. Unencrypted keys are
//! highlighted. Colors are disabled when stdout is not a TTY, when writing to
//! a file, or when the `NO_COLOR` environment variable is set.

use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::Path;

use crate::config::{ReportConfig, Verbosity};
use crate::models::{KeyRecord, Reporter, ScanResult};
use crate::reporting::write_to_file;
use crate::SkpError;

// ---------------------------------------------------------------------------
// ANSI escape codes
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED_BOLD: &str = "\x1b[31m\x1b[1m";
const GREEN: &str = "\x1b[32m";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns `true` when ANSI color output should be used.
fn use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}

fn encryption_label(r: &KeyRecord, color: bool) -> String {
    match (r.encrypted, color) {
        (true, true) => format!("{GREEN}encrypted  {RESET}"),
        (true, false) => "encrypted  ".to_string(),
        (false, true) => format!("{RED_BOLD}UNENCRYPTED{RESET}"),
        (false, false) => "UNENCRYPTED".to_string(),
    }
}

/// Shortens a path for display: replaces the invoking user's $HOME with `~`.
fn display_path(path: &Path) -> String {
    let home = std::env::var("HOME").unwrap_or_default();
    let s = path.to_string_lossy();
    if !home.is_empty() && home != "/" {
        if let Some(rest) = s.strip_prefix(&home) {
            if rest.starts_with('/') {
                return format!("~{rest}");
            }
        }
    }
    s.into_owned()
}

fn distinct_users(records: &[KeyRecord]) -> usize {
    let mut uids: Vec<&str> = records.iter().map(|r| r.uid.as_str()).collect();
    uids.sort_unstable();
    uids.dedup();
    uids.len()
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Formats the scan result for a human reader.
pub(crate) fn format_terminal(result: &ScanResult, config: &ReportConfig, color: bool) -> String {
    let meta = &result.scan_metadata;
    let mut out = String::new();

    let (b_on, b_off) = if color { (BOLD, RESET) } else { ("", "") };
    let (d_on, d_off) = if color { (DIM, RESET) } else { ("", "") };

    if config.verbosity != Verbosity::Quiet {
        let _ = writeln!(out, "\n{b_on}── SSH Key Probe v{} ──{b_off}", meta.skp_version);

        let elapsed = meta.completed_at.signed_duration_since(meta.started_at);
        let secs = elapsed.num_milliseconds() as f64 / 1000.0;
        let _ = writeln!(
            out,
            "\nUsers scanned: {}  |  Files read: {}  |  Time: {:.1}s\n",
            meta.users_scanned, meta.files_read, secs
        );

        if !result.records.is_empty() {
            let uid_width = result
                .records
                .iter()
                .map(|r| r.uid.len())
                .max()
                .unwrap_or(0)
                .max("UID".len());
            let _ = writeln!(
                out,
                "{d_on}{:<uid_width$}  {:<11}  PATH{d_off}",
                "UID", "ENCRYPTION"
            );
            for r in &result.records {
                let _ = writeln!(
                    out,
                    "{:<uid_width$}  {}  {}",
                    r.uid,
                    encryption_label(r, color),
                    display_path(&r.path)
                );
            }
            out.push('\n');
        }
    }

    let total = result.records.len();
    let encrypted = result.records.iter().filter(|r| r.encrypted).count();
    let users = distinct_users(&result.records);
    let _ = writeln!(
        out,
        "{b_on}{total} key{} found{b_off} ({encrypted} encrypted, {} unencrypted) across {users} user{}",
        plural(total),
        total - encrypted,
        plural(users)
    );

    out
}

// ---------------------------------------------------------------------------
// TerminalReporter
// ---------------------------------------------------------------------------

/// Human-readable reporter, the default output format.
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn format_name(&self) -> &str {
        "terminal"
    }

    fn report(&self, result: &ScanResult, config: &ReportConfig) -> Result<(), SkpError> {
        let color = use_color() && config.output_path.is_none();
        let output = format_terminal(result, config, color);

        if let Some(path) = &config.output_path {
            write_to_file(path, output.as_bytes())?;
        } else {
            print!("{output}");
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportFormat;
    use crate::models::ScanMetadata;
    use chrono::Utc;
    use std::path::PathBuf;

    fn record(uid: &str, path: &str, encrypted: bool) -> KeyRecord {
        KeyRecord {
            uid: uid.to_string(),
            path: PathBuf::from(path),
            encrypted,
        }
    }

    fn make_scan_result(records: Vec<KeyRecord>) -> ScanResult {
        let now = Utc::now();
        ScanResult {
            records,
            scan_metadata: ScanMetadata {
                started_at: now,
                completed_at: now,
                users_scanned: 3,
                files_read: 7,
                skp_version: "0.1.0".to_string(),
            },
        }
    }

    fn config(verbosity: Verbosity) -> ReportConfig {
        ReportConfig {
            format: ReportFormat::Terminal,
            verbosity,
            output_path: None,
        }
    }

    #[test]
    fn lists_each_row() {
        let result = make_scan_result(vec![
            record("1000", "/srv/home/alice/.ssh/id_rsa", false),
            record("1001", "/srv/home/bob/.ssh/id_ed25519", true),
        ]);
        let out = format_terminal(&result, &config(Verbosity::Normal), false);

        assert!(out.contains("SSH Key Probe v0.1.0"));
        assert!(out.contains("Users scanned: 3"));
        assert!(out.contains("1000  UNENCRYPTED  /srv/home/alice/.ssh/id_rsa"));
        assert!(out.contains("1001  encrypted    /srv/home/bob/.ssh/id_ed25519"));
    }

    #[test]
    fn summary_counts_keys_and_users() {
        let result = make_scan_result(vec![
            record("1000", "/a/.ssh/k1", false),
            record("1000", "/a/.ssh/k2", true),
            record("0", "/root/.ssh/k3", true),
        ]);
        let out = format_terminal(&result, &config(Verbosity::Normal), false);
        assert!(out.contains("3 keys found (2 encrypted, 1 unencrypted) across 2 users"));
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let out = format_terminal(&make_scan_result(vec![]), &config(Verbosity::Normal), false);
        assert!(out.contains("0 keys found (0 encrypted, 0 unencrypted) across 0 users"));
        assert!(!out.contains("PATH"));
    }

    #[test]
    fn quiet_prints_only_summary() {
        let result = make_scan_result(vec![record("1000", "/a/.ssh/id_rsa", false)]);
        let out = format_terminal(&result, &config(Verbosity::Quiet), false);
        assert_eq!(
            out,
            "1 key found (0 encrypted, 1 unencrypted) across 1 user\n"
        );
    }

    #[test]
    fn no_escape_codes_without_color() {
        let result = make_scan_result(vec![record("1000", "/a/.ssh/id_rsa", false)]);
        let out = format_terminal(&result, &config(Verbosity::Normal), false);
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn unencrypted_is_highlighted_with_color() {
        let result = make_scan_result(vec![record("1000", "/a/.ssh/id_rsa", false)]);
        let out = format_terminal(&result, &config(Verbosity::Normal), true);
        assert!(out.contains(&format!("{RED_BOLD}UNENCRYPTED{RESET}")));
    }

    #[test]
    fn display_path_leaves_foreign_paths_alone() {
        assert_eq!(
            display_path(Path::new("/nonexistent-home/x/.ssh/id_rsa")),
            "/nonexistent-home/x/.ssh/id_rsa"
        );
    }
}
