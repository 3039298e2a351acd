pub mod cli;
pub mod collectors;
pub mod config;
pub mod models;
pub mod reporting;

use thiserror::Error;

/// Top-level error type for SSH Key Probe.
///
/// Only `Config`, `Io` and `Report` ever reach the CLI. `Listing`, `Read` and
/// `Users` are produced by the scan stages and consumed where they occur.
#[derive(Debug, Error)]
pub enum SkpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot list directory: {0}")]
    Listing(String),

    #[error("Cannot read file: {0}")]
    Read(String),

    #[error("User enumeration error: {0}")]
    Users(String),

    #[error("Report error: {0}")]
    Report(String),
}
