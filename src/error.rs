use thiserror::Error;

/// Main error type for the GL860 loader.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum Gl860Error {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    DuckDBError(#[from] duckdb::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Extraction errors
    #[error("{0}")]
    ExtractError(#[from] crate::extract::ExtractError),

    // Database module errors
    #[error("{0}")]
    DatabaseError(#[from] crate::database::DatabaseError),
}

impl Gl860Error {
    /// Whether the error was raised while talking to the datastore rather than while reading a file.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Gl860Error::DatabaseError(_) | Gl860Error::DuckDBError(_))
    }

    /// Whether the same input may succeed on another attempt. Content that failed to parse
    /// fails the same way every time; datastore and file system trouble can clear up.
    pub fn is_retryable(&self) -> bool {
        self.is_database_error() || matches!(self, Gl860Error::IoError(_))
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, Gl860Error> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| Gl860Error::WithContextError(format!("{}: {}", message, e)))
    }
}
