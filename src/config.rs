//! Pipeline configuration (spec §6 "Configuration surface").
//!
//! Grounded on `config.rs`'s `Config` / `prefer::FromValue` layering: a
//! TOML file discovered via `prefer`, with defaults supplied by `#[derive]`
//! and environment-variable overrides applied afterward, the same shape as
//! the teacher's `Config::load` / `DatabaseUrlEnv::from_env` split.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::reference::TicketTypeName;
use crate::pipeline::preflight::PreflightConfig;
use crate::repository::{is_postgres_url, validate_database_url, DbError};

const ENV_PREFIX: &str = "TRUCKTICKET";
const APP_NAME: &str = "truckticket";

fn default_job_code() -> String {
    "24-105".to_string()
}

fn default_ticket_type() -> String {
    "EXPORT".to_string()
}

fn default_pdf_dpi() -> u32 {
    300
}

fn default_duplicate_window_days() -> i64 {
    crate::duplicate::DEFAULT_WINDOW_DAYS
}

fn default_timeout_per_file_secs() -> u64 {
    300
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

/// Orientation-detection strategy selector (spec §6). The core treats this
/// as an opaque label passed through to whichever OCR engine is wired in;
/// it owns no orientation logic of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrientationMethod {
    Tesseract,
    Doctr,
    #[default]
    None,
}

/// Per-export-artifact toggles (spec §6 "Output destinations").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportToggles {
    #[serde(default = "default_true")]
    pub workbook: bool,
    #[serde(default = "default_true")]
    pub invoice_csv: bool,
    #[serde(default = "default_true")]
    pub manifest_csv: bool,
    #[serde(default = "default_true")]
    pub review_csv: bool,
    #[serde(default)]
    pub review_json: bool,
}

impl Default for ExportToggles {
    fn default() -> Self {
        Self { workbook: true, invoice_csv: true, manifest_csv: true, review_csv: true, review_json: false }
    }
}

/// The full batch-start configuration surface (spec §6). All fields are
/// optional in the on-disk TOML; this struct carries the resolved defaults.
#[derive(Debug, Clone, Serialize, Deserialize, prefer::FromValue)]
pub struct PipelineConfig {
    #[serde(default = "default_job_code")]
    pub job_code: String,
    #[serde(default = "default_ticket_type")]
    pub ticket_type_name: String,

    #[serde(default)]
    pub ocr_engine: Option<String>,
    #[serde(default = "default_pdf_dpi")]
    pub pdf_dpi: u32,
    #[serde(default)]
    #[prefer(default)]
    pub orientation_method: OrientationMethod,

    #[serde(default = "default_duplicate_window_days")]
    pub duplicate_window_days: i64,
    #[serde(default = "default_true")]
    pub check_duplicate_files: bool,

    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default = "crate::batch::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_timeout_per_file_secs")]
    pub timeout_per_file_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_true")]
    pub continue_on_error: bool,
    #[serde(default = "default_true")]
    pub rollback_on_critical: bool,

    #[serde(default)]
    #[prefer(default)]
    pub preflight: PreflightTomlConfig,

    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    #[prefer(default)]
    pub exports: ExportToggles,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

/// TOML-facing mirror of [`PreflightConfig`] (the runtime type has no serde
/// derive since it is a pure-computation value, not a config surface).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PreflightTomlConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dpi_threshold")]
    pub dpi_threshold: u32,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_blank_std_threshold")]
    pub blank_std_threshold: f64,
    #[serde(default = "default_min_resolution")]
    pub min_resolution: (u32, u32),
}

fn default_dpi_threshold() -> u32 {
    150
}
fn default_min_chars() -> usize {
    10
}
fn default_blank_std_threshold() -> f64 {
    5.0
}
fn default_min_resolution() -> (u32, u32) {
    (600, 600)
}

impl Default for PreflightTomlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dpi_threshold: default_dpi_threshold(),
            min_chars: default_min_chars(),
            blank_std_threshold: default_blank_std_threshold(),
            min_resolution: default_min_resolution(),
        }
    }
}

impl From<PreflightTomlConfig> for PreflightConfig {
    fn from(value: PreflightTomlConfig) -> Self {
        Self {
            enabled: value.enabled,
            dpi_threshold: value.dpi_threshold,
            min_chars: value.min_chars,
            blank_std_threshold: value.blank_std_threshold,
            min_resolution: value.min_resolution,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            job_code: default_job_code(),
            ticket_type_name: default_ticket_type(),
            ocr_engine: None,
            pdf_dpi: default_pdf_dpi(),
            orientation_method: OrientationMethod::default(),
            duplicate_window_days: default_duplicate_window_days(),
            check_duplicate_files: true,
            max_workers: None,
            chunk_size: 1,
            timeout_per_file_secs: default_timeout_per_file_secs(),
            retry_attempts: default_retry_attempts(),
            continue_on_error: true,
            rollback_on_critical: true,
            preflight: PreflightTomlConfig::default(),
            output_dir: None,
            exports: ExportToggles::default(),
            database_url: None,
            source_path: None,
        }
    }
}

impl PipelineConfig {
    /// Load from a specific TOML file. Unset fields fall back to the
    /// `#[serde(default = ...)]` values above.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read config file: {e}"))?;
        let mut config: PipelineConfig = toml::from_str(&contents).map_err(|e| format!("failed to parse config TOML: {e}"))?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Default configuration, as if no file were found at all.
    pub fn default_with_env() -> Self {
        Self::default()
    }

    /// Discover a `truckticket.{toml,json,yaml,...}`/`config.*` file in the
    /// standard locations `prefer` searches, the way the teacher's
    /// `Config::load` does, and parse whatever it finds with `toml`/`serde`.
    /// Falls back to [`Self::default_with_env`] when nothing is found or the
    /// discovered file fails to parse.
    pub async fn load() -> Self {
        match prefer::load(APP_NAME).await {
            Ok(discovered) => match discovered.source_path() {
                Some(path) => Self::load_from_path(path).unwrap_or_else(|err| {
                    tracing::warn!(path = %path.display(), error = %err, "failed to parse discovered config file, using defaults");
                    Self::default_with_env()
                }),
                None => Self::default_with_env(),
            },
            Err(_) => Self::default_with_env(),
        }
    }

    pub fn ticket_type(&self) -> TicketTypeName {
        TicketTypeName::parse(&self.ticket_type_name).unwrap_or(TicketTypeName::Export)
    }

    pub fn timeout_per_file(&self) -> Duration {
        Duration::from_secs(self.timeout_per_file_secs)
    }

    pub fn to_batch_config(&self, glob_pattern: &str) -> crate::batch::BatchConfig {
        crate::batch::BatchConfig {
            max_workers: self.max_workers,
            chunk_size: self.chunk_size,
            timeout_per_file: self.timeout_per_file(),
            retry_attempts: self.retry_attempts,
            continue_on_error: self.continue_on_error,
            rollback_on_critical: self.rollback_on_critical,
            check_duplicate_files: self.check_duplicate_files,
            glob_pattern: glob_pattern.to_string(),
        }
    }
}

/// Where the database connection comes from, in priority order (spec §6):
/// an explicit connection string, a `DB_SERVER`/`DB_NAME`/`DB_USERNAME`/
/// `DB_PASSWORD` quartet of environment variables, or an embedded SQLite
/// path for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSource {
    ConnectionString(String),
    Embedded(PathBuf),
}

impl DatabaseSource {
    /// Resolve in the priority order spec §6 names: an explicit
    /// `connection_string` argument, then `<APP>_DB_URL`, then the
    /// `<APP>_DB_SERVER/_NAME/_USERNAME/_PASSWORD` quartet, then
    /// `embedded_default` as the final fallback.
    pub fn resolve(connection_string: Option<&str>, embedded_default: &Path) -> Result<Self, DbError> {
        if let Some(url) = connection_string {
            validate_database_url(url)?;
            return Ok(DatabaseSource::ConnectionString(url.to_string()));
        }

        if let Ok(url) = std::env::var(format!("{ENV_PREFIX}_DB_URL")) {
            if !url.is_empty() {
                validate_database_url(&url)?;
                return Ok(DatabaseSource::ConnectionString(url));
            }
        }

        let quartet = (
            std::env::var(format!("{ENV_PREFIX}_DB_SERVER")).ok(),
            std::env::var(format!("{ENV_PREFIX}_DB_NAME")).ok(),
            std::env::var(format!("{ENV_PREFIX}_DB_USERNAME")).ok(),
            std::env::var(format!("{ENV_PREFIX}_DB_PASSWORD")).ok(),
        );
        if let (Some(server), Some(name), Some(user), Some(password)) = quartet {
            let url = format!("postgresql://{user}:{password}@{server}/{name}");
            validate_database_url(&url)?;
            return Ok(DatabaseSource::ConnectionString(url));
        }

        Ok(DatabaseSource::Embedded(embedded_default.to_path_buf()))
    }

    pub fn connection_string(&self) -> String {
        match self {
            DatabaseSource::ConnectionString(url) => url.clone(),
            DatabaseSource::Embedded(path) => path.to_string_lossy().to_string(),
        }
    }

    pub fn is_postgres(&self) -> bool {
        matches!(self, DatabaseSource::ConnectionString(url) if is_postgres_url(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.job_code, "24-105");
        assert_eq!(config.ticket_type_name, "EXPORT");
        assert_eq!(config.pdf_dpi, 300);
        assert_eq!(config.duplicate_window_days, 120);
        assert_eq!(config.timeout_per_file_secs, 300);
        assert_eq!(config.retry_attempts, 2);
        assert!(config.continue_on_error);
        assert!(config.rollback_on_critical);
    }

    #[test]
    fn load_from_path_parses_partial_toml_against_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "job_code = \"24-110\"\nretry_attempts = 5\n").unwrap();
        let config = PipelineConfig::load_from_path(&path).unwrap();
        assert_eq!(config.job_code, "24-110");
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.ticket_type_name, "EXPORT"); // falls back to default
    }

    #[test]
    fn explicit_connection_string_wins_over_environment() {
        let source = DatabaseSource::resolve(Some("sqlite://explicit.db"), Path::new("/tmp/default.db")).unwrap();
        assert_eq!(source, DatabaseSource::ConnectionString("sqlite://explicit.db".to_string()));
    }

    #[test]
    fn no_connection_string_or_env_falls_back_to_embedded() {
        let source = DatabaseSource::resolve(None, Path::new("/tmp/default.db")).unwrap();
        assert_eq!(source, DatabaseSource::Embedded(PathBuf::from("/tmp/default.db")));
    }
}
