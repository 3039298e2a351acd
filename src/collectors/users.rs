//! User enumeration from a passwd(5) database file.
//!
//! Each non-comment line is `name:password:uid:gid:gecos:directory:shell`.
//! Only `uid` and `directory` are used. Empty or missing fields become `None`
//! so the key scanner can skip incomplete rows instead of guessing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{QueryContext, UserRow, UserSource};
use crate::SkpError;

/// Zero-based field positions in a passwd line.
const UID_FIELD: usize = 2;
const DIRECTORY_FIELD: usize = 5;

/// Reads users from a passwd-format file, `/etc/passwd` by default.
pub struct PasswdUserSource {
    path: PathBuf,
}

impl PasswdUserSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PasswdUserSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for PasswdUserSource {
    fn default() -> Self {
        PasswdUserSource::new("/etc/passwd")
    }
}

impl UserSource for PasswdUserSource {
    fn name(&self) -> &str {
        "passwd"
    }

    fn users(&self, context: &QueryContext) -> Result<Vec<UserRow>, SkpError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| SkpError::Users(format!("{}: {}", self.path.display(), e)))?;
        Ok(parse_passwd(&content)
            .into_iter()
            .filter(|row| match &row.uid {
                Some(uid) => context.matches_uid(uid),
                None => !context.has_uid_constraints(),
            })
            .collect())
    }
}

/// Parses passwd text into rows, one per non-blank, non-comment line.
pub(crate) fn parse_passwd(content: &str) -> Vec<UserRow> {
    content
        .lines()
        .filter(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(parse_passwd_line)
        .collect()
}

fn parse_passwd_line(line: &str) -> UserRow {
    let fields: Vec<&str> = line.split(':').collect();
    let field = |i: usize| {
        fields
            .get(i)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
    };
    UserRow {
        uid: field(UID_FIELD).map(str::to_string),
        directory: field(DIRECTORY_FIELD).map(PathBuf::from),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
