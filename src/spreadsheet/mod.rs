//! Minimal Office Open XML reader producing sparse, typed worksheets.

pub(crate) mod cell;
mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Spreadsheet '{0}' is encrypted or is not an Office Open XML workbook")]
    SpreadsheetEncryptedError(String),

    #[error("Spreadsheet '{0}' has no worksheet")]
    SpreadsheetEmptyError(String),

    #[error("Spreadsheet '{0}' is missing part '{1}'")]
    FileError(String, String),

    #[error("Invalid shared string reference at '{0}'!{1}!{2}")]
    SharedStringError(String, String, String),
}
