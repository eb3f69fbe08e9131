//! Idempotent import of logger exports into the store.
//!
//! Each file goes through the same steps: fingerprint the bytes, stop if identical content
//! was already imported, apply the existing-month policy, extract, then write readings and
//! the import log entry in one transaction. Failures are logged and recorded as `FAILED`
//! entries, and a directory batch moves on to the next file. Content that failed for a reason
//! another attempt cannot fix is not tried again until it changes.

pub mod confirm;
pub mod notify;

use crate::database::import_log::ImportRecord;
use crate::database::import_log::ImportStatus;
use crate::database::ImportBatch;
use crate::database::Store;
use crate::error::Gl860Error;
use crate::extract::channel::ChannelMap;
use crate::extract::period::Period;
use crate::extract::Extractor;
use crate::helpers::source::file_name;
use crate::helpers::source::SourceFile;
use crate::loader::confirm::Confirm;
use crate::loader::confirm::TerminalConfirm;
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Office writes `~$<name>` lock files next to open workbooks.
const LOCK_FILE_PREFIX: &str = "~$";

/// What to do with a file whose month already has readings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExistingMonth {
    /// Import anyway, duplicates are dropped row by row
    #[default]
    Import,
    Skip,
    /// Ask the operator, a "no" skips the file
    Ask,
}

impl ExistingMonth {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExistingMonth::Import => "import",
            ExistingMonth::Skip => "skip",
            ExistingMonth::Ask => "ask",
        }
    }
}

impl FromStr for ExistingMonth {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "import" => Ok(ExistingMonth::Import),
            "skip" => Ok(ExistingMonth::Skip),
            "ask" => Ok(ExistingMonth::Ask),
            _ => Err(anyhow::anyhow!("Unknown existing-month policy '{}'", value)),
        }
    }
}

impl fmt::Display for ExistingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoaderOptions {
    pub existing_month: ExistingMonth,
    /// Imported and already-imported files are moved here when set
    pub processed_dir: Option<PathBuf>,
}

/// A file whose readings were committed.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportSummary {
    pub file_name: String,
    pub period: Period,
    pub channels: ChannelMap,
    pub inserted: usize,
    pub duplicates: usize,
    /// Rows dropped for an unreadable timestamp
    pub row_errors: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

#[derive(Debug)]
pub enum FileOutcome {
    Imported(ImportSummary),
    /// Identical content was imported before
    AlreadyImported { file_name: String, previous: ImportRecord },
    ExistingMonthSkipped { file_name: String, period: Period },
    /// Identical content failed before and would fail the same way again
    PreviouslyFailed { file_name: String, previous: ImportRecord },
    Failed {
        file_name: String,
        error: Gl860Error,
        /// Whether a `FAILED` import log entry was written
        recorded: bool,
    },
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            FileOutcome::Imported(summary) => &summary.file_name,
            FileOutcome::AlreadyImported { file_name, .. }
            | FileOutcome::ExistingMonthSkipped { file_name, .. }
            | FileOutcome::PreviouslyFailed { file_name, .. }
            | FileOutcome::Failed { file_name, .. } => file_name,
        }
    }

    fn is_done(&self) -> bool {
        matches!(self, FileOutcome::Imported(_) | FileOutcome::AlreadyImported { .. })
    }
}

/// Counts of one directory pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchSummary {
    pub files: usize,
    pub imported: usize,
    pub already_imported: usize,
    pub skipped: usize,
    /// Unchanged files whose earlier failure was permanent
    pub previously_failed: usize,
    pub failed: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// File name and error text of each failure
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn add(&mut self, outcome: &FileOutcome) {
        self.files += 1;
        match outcome {
            FileOutcome::Imported(summary) => {
                self.imported += 1;
                self.inserted += summary.inserted;
                self.duplicates += summary.duplicates;
            }
            FileOutcome::AlreadyImported { .. } => self.already_imported += 1,
            FileOutcome::ExistingMonthSkipped { .. } => self.skipped += 1,
            FileOutcome::PreviouslyFailed { .. } => self.previously_failed += 1,
            FileOutcome::Failed { file_name, error, .. } => {
                self.failed += 1;
                self.failures.push((file_name.to_owned(), error.to_string()));
            }
        }
    }

    /// Whether the pass changed anything or failed somewhere.
    pub fn is_noteworthy(&self) -> bool {
        self.imported > 0 || self.failed > 0
    }

    pub fn subject(&self) -> String {
        if self.failed > 0 {
            format!("GL860 import finished with {} failed file(s)", self.failed)
        } else {
            format!("GL860 import finished: {}/{} file(s) imported", self.imported, self.files)
        }
    }

    pub fn body(&self) -> String {
        let mut body = format!(
            "Files found: {}\nImported: {}\nAlready imported: {}\nSkipped: {}\nPreviously failed: {}\n\
             Failed: {}\nRows inserted: {}\nDuplicate rows: {}",
            self.files,
            self.imported,
            self.already_imported,
            self.skipped,
            self.previously_failed,
            self.failed,
            self.inserted,
            self.duplicates
        );
        for (file_name, message) in &self.failures {
            body.push_str(&format!("\n{}: {}", file_name, message));
        }
        body
    }
}

pub struct Loader {
    store: Store,
    extractor: Extractor,
    options: LoaderOptions,
    confirm: Box<dyn Confirm>,
}

impl Loader {
    pub fn new(store: Store, extractor: Extractor, options: LoaderOptions) -> Loader {
        Loader {
            store,
            extractor,
            options,
            confirm: Box::new(TerminalConfirm),
        }
    }

    /// Replaces the terminal prompt used by [`ExistingMonth::Ask`].
    pub fn with_confirm(mut self, confirm: Box<dyn Confirm>) -> Loader {
        self.confirm = confirm;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    /// Imports one file from disk, moving it to the processed directory when it is done.
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P) -> FileOutcome {
        let path = path.as_ref();
        let outcome = match SourceFile::read(path) {
            Ok(source) => self.import_source(&source),
            Err(error) => {
                let file_name = file_name(path);
                error!(file = %file_name, "{}", error);
                let recorded = self.record_failure(&file_name, "", &error);
                FileOutcome::Failed {
                    file_name,
                    error,
                    recorded,
                }
            }
        };

        if outcome.is_done() {
            if let Some(processed_dir) = &self.options.processed_dir {
                if let Err(error) = move_into(path, processed_dir) {
                    warn!(file = %outcome.file_name(), "Cannot move to '{}': {}", processed_dir.display(), error);
                }
            }
        }
        outcome
    }

    /// Imports a file already held in memory.
    pub fn import_source(&mut self, source: &SourceFile) -> FileOutcome {
        let fingerprint = source.fingerprint();
        match self.try_import_source(source, &fingerprint) {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(file = %source.name, "Import failed: {}", error);
                let recorded = self.record_failure(&source.name, &fingerprint, &error);
                FileOutcome::Failed {
                    file_name: source.name.to_owned(),
                    error,
                    recorded,
                }
            }
        }
    }

    fn try_import_source(&mut self, source: &SourceFile, fingerprint: &str) -> Result<FileOutcome, Gl860Error> {
        if let Some(previous) = self.store.find_previous_import(fingerprint)? {
            let file_name = source.name.to_owned();
            return Ok(match previous.status {
                ImportStatus::Success => {
                    info!(
                        file = %source.name,
                        previous = %previous.filename,
                        imported_at = %previous.import_time,
                        "Already imported, skipped"
                    );
                    FileOutcome::AlreadyImported { file_name, previous }
                }
                ImportStatus::Failed => {
                    debug!(
                        file = %source.name,
                        failed_at = %previous.import_time,
                        "Unchanged since a permanent failure, skipped"
                    );
                    FileOutcome::PreviouslyFailed { file_name, previous }
                }
            });
        }

        if self.options.existing_month != ExistingMonth::Import {
            // An unparseable name is reported by the extractor below
            if let Ok(period) = Period::from_file_name(&source.name) {
                if self.store.month_exists(period)? && !self.reimport_month(&source.name, period) {
                    info!(file = %source.name, %period, "Month already loaded, skipped");
                    return Ok(FileOutcome::ExistingMonthSkipped {
                        file_name: source.name.to_owned(),
                        period,
                    });
                }
            }
        }

        let extraction = self.extractor.extract(source)?;
        let committed = self.store.commit_import(&ImportBatch {
            file_name: &source.name,
            fingerprint,
            readings: &extraction.readings,
        })?;

        let summary = ImportSummary {
            file_name: source.name.to_owned(),
            period: extraction.period,
            channels: extraction.channels,
            inserted: committed.inserted,
            duplicates: committed.duplicates,
            row_errors: extraction.row_errors.len(),
            date_range: committed.date_range,
        };
        info!(
            file = %summary.file_name,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            row_errors = summary.row_errors,
            "Imported"
        );
        Ok(FileOutcome::Imported(summary))
    }

    fn reimport_month(&mut self, file_name: &str, period: Period) -> bool {
        match self.options.existing_month {
            ExistingMonth::Import => true,
            ExistingMonth::Skip => false,
            ExistingMonth::Ask => self
                .confirm
                .confirm(&format!("{} already has readings for {}. Import it again?", file_name, period)),
        }
    }

    fn record_failure(&mut self, file_name: &str, fingerprint: &str, error: &Gl860Error) -> bool {
        let recorded = self
            .store
            .record_failure(file_name, fingerprint, &error.to_string(), error.is_retryable());
        match recorded {
            Ok(()) => true,
            Err(record_error) => {
                error!(file = %file_name, "Cannot record failed import: {}", record_error);
                false
            }
        }
    }

    /// Imports every file of `dir` matching `pattern`, in file name order.
    ///
    /// A failing file does not stop the batch.
    ///
    /// # Errors
    /// Only an invalid pattern or an unreadable directory.
    pub fn import_directory<P: AsRef<Path>>(&mut self, dir: P, pattern: &str) -> Result<BatchSummary, Gl860Error> {
        let files = find_files(dir.as_ref(), pattern)?;
        info!(dir = %dir.as_ref().display(), pattern, files = files.len(), "Scanning for exports");

        let mut summary = BatchSummary::default();
        for path in files {
            let outcome = self.import_file(&path);
            summary.add(&outcome);
        }
        info!(
            files = summary.files,
            imported = summary.imported,
            already_imported = summary.already_imported,
            skipped = summary.skipped,
            previously_failed = summary.previously_failed,
            failed = summary.failed,
            inserted = summary.inserted,
            "Batch finished"
        );
        Ok(summary)
    }
}

/// Regular files of `dir` matching `pattern`, lock files excluded, sorted by name.
pub fn find_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Gl860Error> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/'),
        pattern
    );
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(glob::GlobError::into_error)?;
        if path.is_file() && !file_name(&path).starts_with(LOCK_FILE_PREFIX) {
            files.push(path);
        }
    }
    files.sort_by_key(|path| file_name(path));
    Ok(files)
}

fn move_into(path: &Path, dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let target = dir.join(file_name(path));
    fs::rename(path, &target)?;
    info!(file = %file_name(path), target = %target.display(), "Moved to processed directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_month_from_str() {
        assert_eq!("import".parse::<ExistingMonth>().unwrap(), ExistingMonth::Import);
        assert_eq!(" SKIP ".parse::<ExistingMonth>().unwrap(), ExistingMonth::Skip);
        assert_eq!("Ask".parse::<ExistingMonth>().unwrap(), ExistingMonth::Ask);
        assert!("overwrite".parse::<ExistingMonth>().is_err());
        assert_eq!(ExistingMonth::Skip.to_string(), "skip");
    }

    #[test]
    fn test_find_files_sorted_without_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["B_2509.xlsx", "A_2508.xlsx", "~$A_2508.xlsx", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("C_2510.xlsx")).unwrap();

        let files = find_files(dir.path(), "*.xlsx").unwrap();
        let names: Vec<String> = files.iter().map(|path| file_name(path)).collect();
        assert_eq!(names, vec!["A_2508.xlsx", "B_2509.xlsx"]);
    }

    #[test]
    fn test_find_files_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let error = find_files(dir.path(), "[").unwrap_err();
        assert!(matches!(error, Gl860Error::PatternError(_)));
    }

    #[test]
    fn test_batch_summary_report() {
        let mut summary = BatchSummary::default();
        summary.add(&FileOutcome::ExistingMonthSkipped {
            file_name: "A_2508.xlsx".to_owned(),
            period: Period::new(2025, 8).unwrap(),
        });
        assert!(!summary.is_noteworthy());

        summary.add(&FileOutcome::Failed {
            file_name: "B_2509.xlsx".to_owned(),
            error: Gl860Error::WithContextError("broken".to_owned()),
            recorded: true,
        });
        assert!(summary.is_noteworthy());
        assert_eq!(summary.files, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.subject(), "GL860 import finished with 1 failed file(s)");
        assert!(summary.body().contains("Skipped: 1"));
        assert!(summary.body().ends_with("B_2509.xlsx: broken"));
    }
}
