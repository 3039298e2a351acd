use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;

use crate::SkpError;

// ─── Platform helpers ─────────────────────────────────────────────────────────

/// Returns the invoking user's home directory from `$HOME`, with a `.` fallback.
fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user-level config file path.
/// Respects `$XDG_CONFIG_HOME`; falls back to `~/.config`.
pub fn user_config_path() -> PathBuf {
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_home.join("skp/config.toml")
}

/// Project-level config, looked up in the current directory.
const PROJECT_CONFIG_FILE: &str = ".skp.toml";

const DEFAULT_PASSWD_PATH: &str = "/etc/passwd";

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

// ─── Public config types ──────────────────────────────────────────────────────

/// Top-level configuration container.
#[derive(Debug, Clone, Default)]
pub struct SkpConfig {
    pub scan: ScanConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub passwd_path: PathBuf, // default: /etc/passwd
    pub max_file_size: u64,   // default: 10 MiB in bytes
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub format: ReportFormat, // default: Terminal
    pub verbosity: Verbosity, // default: Normal
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// CLI-provided values that override any config layer. Applied last.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub format: Option<ReportFormat>,
    pub verbose: bool,
    pub quiet: bool,
    pub output: Option<PathBuf>,
    pub passwd_path: Option<PathBuf>,
    pub max_file_size: Option<u64>,
}

// ─── Default implementations ──────────────────────────────────────────────────

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            passwd_path: PathBuf::from(DEFAULT_PASSWD_PATH),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            format: ReportFormat::Terminal,
            verbosity: Verbosity::Normal,
            output_path: None,
        }
    }
}

// ─── Config loading ───────────────────────────────────────────────────────────

impl SkpConfig {
    /// Load config with full layered resolution:
    /// built-in defaults → user config → project config → env vars
    ///
    /// CLI overrides are applied separately via `apply_overrides()`.
    pub fn load() -> Result<Self, SkpError> {
        let mut config = SkpConfig::default();

        // Layer 2: user config (~/.config/skp/config.toml)
        let user_path = user_config_path();
        if user_path.exists() {
            let toml_config = load_toml_file(&user_path)?;
            merge_toml(&mut config, toml_config)?;
        }

        // Layer 3: project config (.skp.toml in cwd)
        let project_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            let toml_config = load_toml_file(&project_path)?;
            merge_toml(&mut config, toml_config)?;
        }

        // Layer 4: environment variables
        apply_env_vars(&mut config);

        Ok(config)
    }

    /// Apply CLI-flag overrides (highest priority, called after `load()`).
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(fmt) = &overrides.format {
            self.report.format = fmt.clone();
        }
        if overrides.verbose {
            self.report.verbosity = Verbosity::Verbose;
        }
        if overrides.quiet {
            self.report.verbosity = Verbosity::Quiet;
        }
        if let Some(output) = &overrides.output {
            self.report.output_path = Some(output.clone());
        }
        if let Some(passwd) = &overrides.passwd_path {
            self.scan.passwd_path = passwd.clone();
        }
        if let Some(size) = overrides.max_file_size {
            self.scan.max_file_size = size;
        }
    }
}

// ─── TOML deserialization structs ─────────────────────────────────────────────
// All fields are optional so a partial file merges on top of the defaults.

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    scan: TomlScanConfig,
    #[serde(default)]
    report: TomlReportConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlScanConfig {
    passwd_path: Option<String>,
    max_file_size: Option<String>, // e.g. "10MB"
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlReportConfig {
    format: Option<String>,
    verbosity: Option<String>,
    output_path: Option<String>,
}

// ─── TOML loading and merging ─────────────────────────────────────────────────

fn load_toml_file(path: &Path) -> Result<TomlConfig, SkpError> {
    let content = fs::read_to_string(path).map_err(|e| {
        SkpError::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| SkpError::Config(format!("Malformed config file {}: {}", path.display(), e)))
}

fn merge_toml(config: &mut SkpConfig, toml: TomlConfig) -> Result<(), SkpError> {
    let s = &toml.scan;
    if let Some(v) = &s.passwd_path {
        if !v.is_empty() {
            config.scan.passwd_path = tilde_expand(v);
        }
    }
    if let Some(v) = &s.max_file_size {
        config.scan.max_file_size = parse_byte_size(v)?;
    }

    let r = &toml.report;
    if let Some(v) = &r.format {
        config.report.format = parse_format(v)?;
    }
    if let Some(v) = &r.verbosity {
        config.report.verbosity = parse_verbosity(v)?;
    }
    if let Some(v) = &r.output_path {
        if !v.is_empty() {
            config.report.output_path = Some(tilde_expand(v));
        }
    }

    Ok(())
}

// ─── Environment variable overrides ──────────────────────────────────────────

/// Invalid values are ignored so a stray variable never blocks a scan.
fn apply_env_vars(config: &mut SkpConfig) {
    if let Ok(v) = env::var("SKP_FORMAT") {
        if let Ok(fmt) = parse_format(&v) {
            config.report.format = fmt;
        }
    }
    if let Ok(v) = env::var("SKP_VERBOSITY") {
        if let Ok(verbosity) = parse_verbosity(&v) {
            config.report.verbosity = verbosity;
        }
    }
    if let Ok(v) = env::var("SKP_PASSWD") {
        if !v.is_empty() {
            config.scan.passwd_path = tilde_expand(&v);
        }
    }
    if let Ok(v) = env::var("SKP_MAX_FILE_SIZE") {
        if let Ok(size) = parse_byte_size(&v) {
            config.scan.max_file_size = size;
        }
    }
}

// ─── Helper functions ─────────────────────────────────────────────────────────

/// Expands a leading `~` to the invoking user's home directory.
pub fn tilde_expand(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}

/// Parse a human-readable byte size string such as `"10MB"` or `"512KiB"`.
pub fn parse_byte_size(s: &str) -> Result<u64, SkpError> {
    let s = s.trim();
    let split_at = s.find(|c: char| c.is_alphabetic()).unwrap_or(s.len());
    let num_str = s[..split_at].trim();
    let unit = s[split_at..].trim();
    let num: u64 = num_str.parse().map_err(|_| {
        SkpError::Config(format!(
            "Invalid file size '{}': expected a number followed by a unit, e.g. '10MB'",
            s
        ))
    })?;
    let multiplier: u64 = match unit.to_uppercase().as_str() {
        "" | "B" => 1,
        "KB" => 1_000,
        "MB" => 1_000_000,
        "GB" => 1_000_000_000,
        "KIB" => 1_024,
        "MIB" => 1_048_576,
        "GIB" => 1_073_741_824,
        other => {
            return Err(SkpError::Config(format!(
                "Unknown size unit '{}' in '{}': expected B, KB, MB, GB, KiB, MiB, or GiB",
                other, s
            )))
        }
    };
    num.checked_mul(multiplier)
        .ok_or_else(|| SkpError::Config(format!("File size '{}' is too large", s)))
}

pub fn parse_format(s: &str) -> Result<ReportFormat, SkpError> {
    match s.to_lowercase().as_str() {
        "terminal" => Ok(ReportFormat::Terminal),
        "json" => Ok(ReportFormat::Json),
        other => Err(SkpError::Config(format!(
            "Unknown format '{}': expected terminal or json",
            other
        ))),
    }
}

fn parse_verbosity(s: &str) -> Result<Verbosity, SkpError> {
    match s.to_lowercase().as_str() {
        "quiet" => Ok(Verbosity::Quiet),
        "normal" => Ok(Verbosity::Normal),
        "verbose" => Ok(Verbosity::Verbose),
        other => Err(SkpError::Config(format!(
            "Unknown verbosity '{}': expected quiet, normal, or verbose",
            other
        ))),
    }
}

// ─── skp init ─────────────────────────────────────────────────────────────────

/// Generate a commented default `config.toml`. Every field is present but
/// commented out.
pub fn generate_default_config() -> String {
    r#"# SSH Key Probe configuration file
# All fields are optional. Uncomment and modify as needed.
# Values shown are the built-in defaults.

[scan]
# passwd_path = "/etc/passwd"   # passwd(5) file listing users and home directories
# max_file_size = "10MiB"       # Files in ~/.ssh larger than this are skipped

[report]
# format = "terminal"           # Output format: terminal | json
# verbosity = "normal"          # Output verbosity: quiet | normal | verbose
# output_path = ""              # Write report to this file (empty = stdout)
"#
    .to_string()
}

/// Write the default config file to `~/.config/skp/config.toml`.
///
/// Returns the path written. Errors if the file already exists and `force` is false.
pub fn write_default_config(force: bool) -> Result<PathBuf, SkpError> {
    write_default_config_to(&user_config_path(), force)
}

fn write_default_config_to(path: &Path, force: bool) -> Result<PathBuf, SkpError> {
    if path.exists() && !force {
        return Err(SkpError::Config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SkpError::Config(format!(
                "Cannot create config directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    fs::write(path, generate_default_config()).map_err(|e| {
        SkpError::Config(format!(
            "Cannot write config file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(path.to_path_buf())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
