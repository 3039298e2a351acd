use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::SkpError;

// ---------------------------------------------------------------------------
// QueryContext
// ---------------------------------------------------------------------------

/// Constraints attached to a key query.
///
/// An empty `uids` list means "every user the user source knows about".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    pub uids: Vec<String>,
}

impl QueryContext {
    /// A context with no constraints.
    pub fn all_users() -> Self {
        QueryContext::default()
    }

    /// A context restricted to `uid = X OR uid = Y ...`.
    pub fn with_uids<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryContext {
            uids: uids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_uid_constraints(&self) -> bool {
        !self.uids.is_empty()
    }

    /// Returns `true` if `uid` satisfies the context's constraints.
    pub fn matches_uid(&self, uid: &str) -> bool {
        !self.has_uid_constraints() || self.uids.iter().any(|u| u == uid)
    }
}

// ---------------------------------------------------------------------------
// UserRow / UserContext
// ---------------------------------------------------------------------------

/// One row produced by a [`UserSource`]. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRow {
    pub uid: Option<String>,
    pub directory: Option<PathBuf>,
}

impl UserRow {
    /// Returns the complete `(uid, directory)` pair, or `None` if either
    /// field is absent.
    pub fn context(&self) -> Option<UserContext> {
        match (&self.uid, &self.directory) {
            (Some(uid), Some(directory)) => Some(UserContext {
                uid: uid.clone(),
                directory: directory.clone(),
            }),
            _ => None,
        }
    }
}

/// A user whose home directory will be scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub uid: String,
    pub directory: PathBuf,
}

// ---------------------------------------------------------------------------
// KeyRecord
// ---------------------------------------------------------------------------

/// A single output row: one file classified as a private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub uid: String,
    pub path: PathBuf,
    pub encrypted: bool,
}

impl KeyRecord {
    /// The `path` column as emitted in rows.
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// The `encrypted` column: `1` or `0`.
    pub fn encrypted_flag(&self) -> u8 {
        u8::from(self.encrypted)
    }
}

// ---------------------------------------------------------------------------
// ScanResult + ScanMetadata
// ---------------------------------------------------------------------------

/// Rows from a complete query plus bookkeeping for the reporters.
#[derive(Debug)]
pub struct ScanResult {
    pub records: Vec<KeyRecord>,
    pub scan_metadata: ScanMetadata,
}

#[derive(Debug)]
pub struct ScanMetadata {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub users_scanned: usize,
    pub files_read: usize,
    pub skp_version: String,
}

// ---------------------------------------------------------------------------
// UserSource trait
// ---------------------------------------------------------------------------

/// Supplies the `(uid, directory)` rows a key query fans out over.
pub trait UserSource {
    /// Human-readable name used in log output.
    fn name(&self) -> &str;

    /// Returns the user rows matching `context`, in source order.
    fn users(&self, context: &QueryContext) -> Result<Vec<UserRow>, SkpError>;
}

// ---------------------------------------------------------------------------
// Reporter trait
// ---------------------------------------------------------------------------

/// The pluggable interface for output formats.
pub trait Reporter {
    fn format_name(&self) -> &str;
    fn report(
        &self,
        result: &ScanResult,
        config: &crate::config::ReportConfig,
    ) -> Result<(), SkpError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
