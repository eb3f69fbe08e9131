//! DuckDB persistence for readings, the import log and derived tables.

pub mod import_log;
mod readings;
pub mod report;
mod schema;
pub mod statistics;

use crate::database::import_log::ImportRecord;
use crate::database::import_log::ImportStatus;
use crate::database::import_log::NewImportRecord;
use crate::error::Gl860Error;
use crate::extract::date_range;
use crate::extract::period::Period;
use crate::extract::reading::Reading;
use chrono::NaiveDate;
use duckdb::Connection;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use tracing::info;

pub const IN_MEMORY: &str = ":memory:";

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The database cannot be opened or its schema cannot be created
    #[error("Cannot use database '{0}': {1}")]
    ConnectivityError(String, duckdb::Error),

    /// A write failed and its transaction was rolled back
    #[error("Write for '{0}' rolled back: {1}")]
    PersistenceError(String, duckdb::Error),

    #[error("Unknown import status '{0}'")]
    StatusError(String),
}

/// Everything one committed file contributes to the database.
#[derive(Clone, Debug)]
pub struct ImportBatch<'a> {
    pub file_name: &'a str,
    pub fingerprint: &'a str,
    pub readings: &'a [Reading],
}

/// What a committed batch changed.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitOutcome {
    pub inserted: usize,
    /// Readings dropped as already stored
    pub duplicates: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Owner of the single DuckDB connection.
pub struct Store {
    connection: Connection,
}

impl Store {
    /// Opens or creates the database file and makes sure the tables exist.
    ///
    /// # Errors
    /// `ConnectivityError` when the file cannot be opened or the schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Store, Gl860Error> {
        let location = path.as_ref().display().to_string();
        let connection = Connection::open(path.as_ref())
            .map_err(|error| DatabaseError::ConnectivityError(location.to_owned(), error))?;
        Store::initialize(connection, &location)
    }

    pub fn open_in_memory() -> Result<Store, Gl860Error> {
        let connection = Connection::open_in_memory()
            .map_err(|error| DatabaseError::ConnectivityError(IN_MEMORY.to_owned(), error))?;
        Store::initialize(connection, IN_MEMORY)
    }

    fn initialize(connection: Connection, location: &str) -> Result<Store, Gl860Error> {
        connection
            .execute_batch(schema::CREATE_SCHEMA)
            .map_err(|error| DatabaseError::ConnectivityError(location.to_owned(), error))?;
        info!(database = %location, "Opened database");
        Ok(Store { connection })
    }

    /// The earlier attempt that decided identical content, if any.
    ///
    /// A success wins over a failure. A failure only counts when it was recorded as not
    /// retryable, so content that hit a datastore error is tried again.
    pub fn find_previous_import(&self, fingerprint: &str) -> Result<Option<ImportRecord>, Gl860Error> {
        Ok(import_log::find_settled(&self.connection, fingerprint)?)
    }

    /// Whether any reading of `period` is stored, whichever file it came from.
    pub fn month_exists(&self, period: Period) -> Result<bool, Gl860Error> {
        Ok(readings::count_for_period(&self.connection, period)? > 0)
    }

    /// Number of stored readings, for one source file or overall.
    pub fn count_readings(&self, source_file: Option<&str>) -> Result<usize, Gl860Error> {
        let count = match source_file {
            Some(source_file) => readings::count_for_file(&self.connection, source_file)?,
            None => self
                .connection
                .query_row("SELECT count(*) FROM gl860_weather_data", [], |row| row.get::<_, i64>(0))?
                as usize,
        };
        Ok(count)
    }

    /// Stores a file's readings and its `SUCCESS` log entry in one transaction.
    ///
    /// Readings already stored for the same `(timestamp, source_file)` are dropped and counted
    /// as duplicates. On any error nothing of the batch is kept.
    ///
    /// # Errors
    /// `PersistenceError` carrying the file name; the transaction is rolled back.
    pub fn commit_import(&mut self, batch: &ImportBatch<'_>) -> Result<CommitOutcome, Gl860Error> {
        let outcome = self
            .try_commit_import(batch)
            .map_err(|error| DatabaseError::PersistenceError(batch.file_name.to_owned(), error))?;
        debug!(
            file = batch.file_name,
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "Committed readings"
        );
        Ok(outcome)
    }

    fn try_commit_import(&mut self, batch: &ImportBatch<'_>) -> duckdb::Result<CommitOutcome> {
        // Dropping the transaction on an early return rolls it back
        let transaction = self.connection.transaction()?;
        let before = readings::count_for_file(&transaction, batch.file_name)?;
        readings::insert_ignoring_duplicates(&transaction, batch.file_name, batch.readings)?;
        let after = readings::count_for_file(&transaction, batch.file_name)?;

        let inserted = after.saturating_sub(before);
        let outcome = CommitOutcome {
            inserted,
            duplicates: batch.readings.len().saturating_sub(inserted),
            date_range: date_range(batch.readings),
        };
        import_log::insert(
            &transaction,
            &NewImportRecord {
                filename: batch.file_name,
                fingerprint: batch.fingerprint,
                records_imported: outcome.inserted,
                records_skipped: outcome.duplicates,
                status: ImportStatus::Success,
                error_message: None,
                date_range: outcome.date_range,
                retryable: false,
            },
        )?;
        transaction.commit()?;
        Ok(outcome)
    }

    /// Writes a `FAILED` log entry in a transaction of its own.
    ///
    /// A failure that is not `retryable` settles its fingerprint, see [`Store::find_previous_import`].
    pub fn record_failure(
        &mut self,
        file_name: &str,
        fingerprint: &str,
        message: &str,
        retryable: bool,
    ) -> Result<(), Gl860Error> {
        let record = NewImportRecord {
            filename: file_name,
            fingerprint,
            records_imported: 0,
            records_skipped: 0,
            status: ImportStatus::Failed,
            error_message: Some(message),
            date_range: None,
            retryable,
        };
        self.try_record(&record)
            .map_err(|error| DatabaseError::PersistenceError(file_name.to_owned(), error))?;
        Ok(())
    }

    fn try_record(&mut self, record: &NewImportRecord<'_>) -> duckdb::Result<()> {
        let transaction = self.connection.transaction()?;
        import_log::insert(&transaction, record)?;
        transaction.commit()
    }
}
