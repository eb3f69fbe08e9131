use crate::database::DatabaseError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use duckdb::params;
use duckdb::Connection;
use duckdb::OptionalExt;
use duckdb::Row;

const SELECT_COLUMNS: &str = "SELECT id, filename, file_hash, records_imported, records_skipped, status, \
     error_message, date_range_start, date_range_end, import_time, retryable FROM import_logs";

const INSERT_RECORD: &str = "INSERT INTO import_logs (filename, file_hash, records_imported, records_skipped, \
     status, error_message, date_range_start, date_range_end, import_time, retryable) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Outcome recorded for an import attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportStatus {
    Success,
    Failed,
}

impl ImportStatus {
    /// Value stored in the `status` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Success => "SUCCESS",
            ImportStatus::Failed => "FAILED",
        }
    }

    pub fn parse(name: &str) -> Result<Self, DatabaseError> {
        match name {
            "SUCCESS" => Ok(ImportStatus::Success),
            "FAILED" => Ok(ImportStatus::Failed),
            _ => Err(DatabaseError::StatusError(name.to_owned())),
        }
    }
}

/// One row of the import log. Written once per attempt and never updated.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportRecord {
    pub id: i64,
    pub filename: String,
    /// SHA-256 of the file content
    pub fingerprint: String,
    pub records_imported: usize,
    /// Readings dropped because an identical `(timestamp, source_file)` row existed
    pub records_skipped: usize,
    pub status: ImportStatus,
    pub error_message: Option<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub import_time: NaiveDateTime,
    /// Set on failures the same content may clear on another attempt
    pub retryable: bool,
}

/// Fields of an import log row before it is stored.
#[derive(Clone, Debug)]
pub(crate) struct NewImportRecord<'a> {
    pub(crate) filename: &'a str,
    pub(crate) fingerprint: &'a str,
    pub(crate) records_imported: usize,
    pub(crate) records_skipped: usize,
    pub(crate) status: ImportStatus,
    pub(crate) error_message: Option<&'a str>,
    pub(crate) date_range: Option<(NaiveDate, NaiveDate)>,
    pub(crate) retryable: bool,
}

pub(crate) fn insert(connection: &Connection, record: &NewImportRecord<'_>) -> duckdb::Result<usize> {
    connection.execute(
        INSERT_RECORD,
        params![
            record.filename,
            record.fingerprint,
            record.records_imported as i64,
            record.records_skipped as i64,
            record.status.as_str(),
            record.error_message,
            record.date_range.map(|(start, _)| start),
            record.date_range.map(|(_, end)| end),
            chrono::Local::now().naive_local(),
            record.retryable,
        ],
    )
}

/// The attempt that settles content with this fingerprint: its earliest success, or else its
/// earliest failure that another attempt cannot fix. Retryable failures are ignored.
pub(crate) fn find_settled(connection: &Connection, fingerprint: &str) -> duckdb::Result<Option<ImportRecord>> {
    let sql = format!(
        "{SELECT_COLUMNS} WHERE file_hash = ? AND (status = 'SUCCESS' OR NOT retryable) \
         ORDER BY (status = 'SUCCESS') DESC, id LIMIT 1"
    );
    connection.query_row(&sql, params![fingerprint], from_row).optional()
}

/// The most recent import attempts, newest first.
pub(crate) fn latest(connection: &Connection, limit: usize) -> duckdb::Result<Vec<ImportRecord>> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT {limit}");
    let mut statement = connection.prepare(&sql)?;
    let records = statement.query_map([], from_row)?;
    records.collect()
}

fn from_row(row: &Row<'_>) -> duckdb::Result<ImportRecord> {
    let status: String = row.get(5)?;
    let status = ImportStatus::parse(&status).map_err(|error| {
        duckdb::Error::FromSqlConversionFailure(5, duckdb::types::Type::Text, error.to_string().into())
    })?;
    let start: Option<NaiveDate> = row.get(7)?;
    let end: Option<NaiveDate> = row.get(8)?;
    Ok(ImportRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        fingerprint: row.get(2)?,
        records_imported: row.get::<_, i64>(3)? as usize,
        records_skipped: row.get::<_, i64>(4)? as usize,
        status,
        error_message: row.get(6)?,
        date_range: start.zip(end),
        import_time: row.get(9)?,
        retryable: row.get(10)?,
    })
}
