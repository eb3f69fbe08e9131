use crate::argsets::ImportArgs;
use anyhow::{anyhow, Result};
use gl860_loader::loader::notify::{LogNotifier, Notifier};
use gl860_loader::loader::{FileOutcome, LoaderOptions};
use gl860_loader::Config;
use tracing::info;

pub fn import(config: &Config, args: ImportArgs) -> Result<()> {
    let options = LoaderOptions {
        existing_month: args.existing_month.unwrap_or(config.existing_month),
        processed_dir: args.processed_dir.or_else(|| config.processed_dir.clone()),
    };
    let mut loader = super::open_loader(config, options)?;

    if let Some(file) = args.file {
        return match loader.import_file(&file) {
            FileOutcome::Failed { file_name, error, .. } => {
                Err(anyhow!("Import of '{}' failed: {}", file_name, error))
            }
            FileOutcome::PreviouslyFailed { file_name, previous } => Err(anyhow!(
                "'{}' is unchanged since its import failed at {}: {}",
                file_name,
                previous.import_time,
                previous.error_message.unwrap_or_default()
            )),
            outcome => {
                info!(file = %outcome.file_name(), "Done");
                Ok(())
            }
        };
    }

    let dir = args.dir.unwrap_or_else(|| config.data_dir.clone());
    let pattern = args.pattern.unwrap_or_else(|| config.file_pattern.clone());
    let summary = loader.import_directory(&dir, &pattern)?;
    LogNotifier.notify(&summary.subject(), &summary.body());

    if summary.failed > 0 {
        Err(anyhow!("{} of {} file(s) failed", summary.failed, summary.files))
    } else {
        Ok(())
    }
}
