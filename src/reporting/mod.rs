//! Output reporters: terminal (human) and JSON (machine).
//!
//! Both implement the [`Reporter`](crate::models::Reporter) trait. The
//! terminal reporter is the default and prints one line per key row. The
//! JSON reporter emits a single object whose `rows` array carries exactly the
//! `uid`, `path` and `encrypted` columns.

use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::SkpError;

pub mod json;
pub mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

/// Writes bytes to a file with restrictive permissions (0600).
pub(crate) fn write_to_file(path: &Path, data: &[u8]) -> Result<(), SkpError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data)?;
    Ok(())
}
