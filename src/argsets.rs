use gl860_loader::loader::ExistingMonth;
use std::path::PathBuf;

/// Flags left unset fall back to the configuration.
pub struct ImportArgs {
    /// Import this single file instead of scanning a directory
    pub file: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub pattern: Option<String>,
    pub existing_month: Option<ExistingMonth>,
    pub processed_dir: Option<PathBuf>,
}

pub struct WatchArgs {
    pub dir: Option<PathBuf>,
    pub interval_secs: Option<u64>,
}

pub struct StatsArgs {
    pub days: usize,
}
