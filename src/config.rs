use crate::helpers::logging::DEFAULT_LOG_LEVEL;
use crate::loader::ExistingMonth;
use anyhow::ensure;
use anyhow::Context;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "weather_data.duckdb";
pub const DEFAULT_DATA_DIR: &str = "GL860";
pub const DEFAULT_FILE_PATTERN: &str = "*.xlsx";
pub const DEFAULT_IMPORT_INTERVAL_SECS: &str = "600";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    /// Directory scanned by batch imports and watch mode
    pub data_dir: PathBuf,
    pub file_pattern: String,
    /// Imported files are moved here when set
    pub processed_dir: Option<PathBuf>,
    /// Pause between two watch-mode passes
    pub import_interval: Duration,
    pub existing_month: ExistingMonth,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `from_env` passing the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let interval_secs: u64 = optional("GL860_IMPORT_INTERVAL_SECS", DEFAULT_IMPORT_INTERVAL_SECS)
            .parse()
            .context("GL860_IMPORT_INTERVAL_SECS must be a positive integer")?;
        ensure!(interval_secs > 0, "GL860_IMPORT_INTERVAL_SECS must be a positive integer");
        Ok(Self {
            database_path: PathBuf::from(optional("GL860_DATABASE", DEFAULT_DATABASE)),
            data_dir: PathBuf::from(optional("GL860_DATA_DIR", DEFAULT_DATA_DIR)),
            file_pattern: optional("GL860_FILE_PATTERN", DEFAULT_FILE_PATTERN),
            processed_dir: lookup("GL860_PROCESSED_DIR")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            import_interval: Duration::from_secs(interval_secs),
            existing_month: optional("GL860_EXISTING_MONTH", ExistingMonth::Import.as_str())
                .parse()
                .context("GL860_EXISTING_MONTH must be one of 'import', 'skip', 'ask'")?,
            log_level: optional("LOG_LEVEL", DEFAULT_LOG_LEVEL),
        })
    }
}
