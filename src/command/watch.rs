use crate::argsets::WatchArgs;
use anyhow::{bail, Result};
use gl860_loader::loader::notify::{LogNotifier, Notifier};
use gl860_loader::loader::{ExistingMonth, LoaderOptions};
use gl860_loader::Config;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Imports the data directory, then sleeps for the interval, forever.
pub fn watch(config: &Config, args: WatchArgs) -> Result<()> {
    let (dir, interval, options) = watch_settings(config, args)?;
    let mut loader = super::open_loader(config, options)?;
    let notifier = LogNotifier;

    info!(dir = %dir.display(), interval_secs = interval.as_secs(), "Watching for exports");
    loop {
        match loader.import_directory(&dir, &config.file_pattern) {
            Ok(summary) if summary.is_noteworthy() => notifier.notify(&summary.subject(), &summary.body()),
            Ok(_) => info!("No new exports"),
            Err(scan_error) => {
                error!("Scan of '{}' failed: {}", dir.display(), scan_error);
                notifier.notify("GL860 import failed", &scan_error.to_string());
            }
        }
        thread::sleep(interval);
    }
}

/// Directory, pause and loader options of an unattended run.
fn watch_settings(config: &Config, args: WatchArgs) -> Result<(PathBuf, Duration, LoaderOptions)> {
    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or(config.import_interval);
    if interval.is_zero() {
        bail!("Watch interval must be at least one second");
    }
    // Nobody is at the terminal to answer a prompt
    if config.existing_month == ExistingMonth::Ask {
        bail!("Existing-month policy 'ask' needs a terminal, use 'import' or 'skip' for watch mode");
    }

    let dir = args.dir.unwrap_or_else(|| config.data_dir.clone());
    let options = LoaderOptions {
        existing_month: config.existing_month,
        processed_dir: config.processed_dir.clone(),
    };
    Ok((dir, interval, options))
}
