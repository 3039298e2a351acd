//! SSH private key scanner.
//!
//! For every user supplied by a [`UserSource`], lists `<home>/.ssh/`, reads
//! each file, and emits a [`KeyRecord`] for files whose contents contain the
//! `PRIVATE KEY` marker. A file that also contains `ENCRYPTED` anywhere is
//! reported as encrypted.
//!
//! Classification is a plain case-sensitive substring search over the raw
//! bytes. It does not parse PEM or OpenSSH structure, so a comment that
//! happens to contain the marker text is reported as a key too.
//!
//! Nothing in here surfaces an error: a missing `.ssh` directory, an
//! unreadable file, an incomplete user row or a failing user source all
//! reduce to "no rows" for that item and the scan moves on.

use tracing::{debug, warn};

use crate::collectors::filesystem::{forensic_read_file, list_files_in_directory};
use crate::config::ScanConfig;
use crate::models::{KeyRecord, QueryContext, UserContext, UserSource};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Per-user key directory, relative to the home directory.
pub const SSH_USER_KEYS_DIR: &str = ".ssh/";

/// Present in every PEM and OpenSSH private key armor line.
const PRIVATE_KEY_MARKER: &[u8] = b"PRIVATE KEY";

/// `Proc-Type: 4,ENCRYPTED` (legacy PEM) and `BEGIN ENCRYPTED PRIVATE KEY`
/// (PKCS#8) both carry this.
const ENCRYPTED_MARKER: &[u8] = b"ENCRYPTED";

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn contains_marker(content: &[u8], marker: &[u8]) -> bool {
    content.windows(marker.len()).any(|w| w == marker)
}

/// Classifies file contents.
///
/// Returns `None` if the content is not a private key, otherwise
/// `Some(encrypted)`.
pub fn classify(content: &[u8]) -> Option<bool> {
    if !contains_marker(content, PRIVATE_KEY_MARKER) {
        return None;
    }
    Some(contains_marker(content, ENCRYPTED_MARKER))
}

// ---------------------------------------------------------------------------
// Per-user scan
// ---------------------------------------------------------------------------

/// Scans one user's `.ssh/` directory, appending a record per private key.
///
/// Returns the number of files that were successfully read.
pub fn scan_user_keys(
    user: &UserContext,
    config: &ScanConfig,
    results: &mut Vec<KeyRecord>,
) -> usize {
    let keys_dir = user.directory.join(SSH_USER_KEYS_DIR);
    let files = match list_files_in_directory(&keys_dir) {
        Ok(f) => f,
        Err(e) => {
            debug!(uid = %user.uid, "no keys scanned: {e}");
            return 0;
        }
    };

    let mut files_read = 0;
    for path in files {
        let content = match forensic_read_file(&path, config.max_file_size) {
            Ok(c) => c,
            Err(e) => {
                debug!(uid = %user.uid, "skipping file: {e}");
                continue;
            }
        };
        files_read += 1;

        if let Some(encrypted) = classify(&content) {
            results.push(KeyRecord {
                uid: user.uid.clone(),
                path,
                encrypted,
            });
        }
    }
    files_read
}

// ---------------------------------------------------------------------------
// Query entry points
// ---------------------------------------------------------------------------

/// Rows and counters from one pass over every user.
#[derive(Debug, Default)]
pub struct KeyScan {
    pub records: Vec<KeyRecord>,
    pub users_scanned: usize,
    pub files_read: usize,
}

/// Runs the key query over every user row `users` yields for `context`.
///
/// Rows lacking a uid or a directory are skipped. A failing user source
/// yields an empty scan.
pub fn collect_user_keys(
    context: &QueryContext,
    users: &dyn UserSource,
    config: &ScanConfig,
) -> KeyScan {
    let mut scan = KeyScan::default();

    let rows = match users.users(context) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("{} user source failed: {e}", users.name());
            return scan;
        }
    };

    for row in &rows {
        let Some(user) = row.context() else {
            debug!(?row, "skipping user row without uid or directory");
            continue;
        };
        scan.files_read += scan_user_keys(&user, config, &mut scan.records);
        scan.users_scanned += 1;
    }
    scan
}

/// Returns the key rows for `context`. Never fails; an empty vector is a
/// valid answer.
pub fn gen_user_ssh_keys(
    context: &QueryContext,
    users: &dyn UserSource,
    config: &ScanConfig,
) -> Vec<KeyRecord> {
    collect_user_keys(context, users, config).records
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
