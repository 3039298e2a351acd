//! Machine-readable JSON reporter.
//!
//! Emits a single JSON object with `version`, `scan` metadata and a `rows`
//! array. Each row has exactly three fields: `uid` (string), `path` (string)
//! and `encrypted` (integer 0 or 1).

use crate::config::ReportConfig;
use crate::models::{KeyRecord, Reporter, ScanResult};
use crate::reporting::write_to_file;
use crate::SkpError;

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Formats the scan result as a pretty-printed JSON string.
pub(crate) fn format_json(result: &ScanResult) -> Result<String, SkpError> {
    let meta = &result.scan_metadata;

    let rows: Vec<serde_json::Value> = result.records.iter().map(record_to_json_value).collect();

    let report = serde_json::json!({
        "version": meta.skp_version,
        "scan": {
            "started_at": meta.started_at.to_rfc3339(),
            "completed_at": meta.completed_at.to_rfc3339(),
            "users_scanned": meta.users_scanned,
            "files_read": meta.files_read,
        },
        "rows": rows,
    });

    serde_json::to_string_pretty(&report).map_err(|e| SkpError::Report(e.to_string()))
}

fn record_to_json_value(r: &KeyRecord) -> serde_json::Value {
    serde_json::json!({
        "uid": r.uid,
        "path": r.path_str(),
        "encrypted": r.encrypted_flag(),
    })
}

// ---------------------------------------------------------------------------
// JsonReporter
// ---------------------------------------------------------------------------

/// Machine-readable JSON reporter for scripting and host ingestion.
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn format_name(&self) -> &str {
        "json"
    }

    fn report(&self, result: &ScanResult, config: &ReportConfig) -> Result<(), SkpError> {
        let json = format_json(result)?;

        if let Some(path) = &config.output_path {
            write_to_file(path, json.as_bytes())?;
        } else {
            println!("{json}");
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
