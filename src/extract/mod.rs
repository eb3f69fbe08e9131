//! Turns a GL860 spreadsheet export into timestamped readings.
//!
//! The export starts with free-form metadata rows. A row whose first cell is `Data` is
//! followed by a field-name row and a unit row, and the readings follow those. Which column
//! is which sensor is inferred from the unit labels, see [`channel`].

pub mod channel;
pub mod period;
pub mod reading;
pub mod region;

use crate::error::Gl860Error;
use crate::error::ResultMessage;
use crate::extract::channel::ChannelMap;
use crate::extract::channel::ChannelMatcher;
use crate::extract::period::Period;
use crate::extract::reading::Reading;
use crate::extract::region::DataRegion;
use crate::helpers::source::SourceFile;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;
use tracing::warn;

pub const DEFAULT_DATA_MARKER: &str = "Data";

/// File-level failures: the file cannot yield any reading.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File name '{0}' has no <prefix>_<YYMM>.xlsx period token")]
    PeriodTokenError(String),

    #[error("Spreadsheet '{0}' has no '{1}' marker in its first column")]
    DataMarkerError(String, String),

    #[error("Spreadsheet '{0}' has no timestamp column below the data marker")]
    TimestampColumnError(String),
}

/// A row left out of the readings because its timestamp could not be read.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Row {row} ({reference}): {message}")]
pub struct RowError {
    /// One-based sheet row
    pub row: usize,
    /// Reference of the offending cell
    pub reference: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Text marking the row above the field names
    pub marker: String,
    /// Worksheet to read, 0 being the first
    pub sheet_index: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            marker: DEFAULT_DATA_MARKER.to_owned(),
            sheet_index: 0,
        }
    }
}

/// The outcome of extracting one file.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub file_name: String,
    pub period: Period,
    pub channels: ChannelMap,
    pub readings: Vec<Reading>,
    /// Non-blank rows in the data block
    pub rows_present: usize,
    pub row_errors: Vec<RowError>,
}

impl Extraction {
    /// Rows of the data block that produced no reading
    pub fn rows_skipped(&self) -> usize {
        self.rows_present.saturating_sub(self.readings.len())
    }

    /// First and last calendar day covered by the readings
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_range(&self.readings)
    }
}

/// First and last calendar day among `readings`.
pub fn date_range(readings: &[Reading]) -> Option<(NaiveDate, NaiveDate)> {
    let first = readings.iter().map(|reading| reading.timestamp).min()?;
    let last = readings.iter().map(|reading| reading.timestamp).max()?;
    Some((first.date(), last.date()))
}

/// Stateless reader of logger exports. One instance can serve any number of files.
pub struct Extractor {
    options: ExtractOptions,
    matchers: Vec<Box<dyn ChannelMatcher>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(ExtractOptions::default())
    }
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Extractor {
        Extractor {
            options,
            matchers: channel::default_matchers(),
        }
    }

    /// Replaces the channel matchers, first match wins.
    pub fn with_matchers(mut self, matchers: Vec<Box<dyn ChannelMatcher>>) -> Extractor {
        self.matchers = matchers;
        self
    }

    /// Opens the configured worksheet and locates its data region.
    ///
    /// # Errors
    /// File-level parse errors: a missing period token, a workbook that cannot be read,
    /// a missing marker or a missing timestamp column.
    pub fn region(&self, source: &SourceFile) -> Result<DataRegion, Gl860Error> {
        let period = Period::from_file_name(&source.name)?;
        let sheet = XlsxSpreadsheet::open(&source.name, &source.bytes)
            .and_then(|mut spreadsheet| spreadsheet.read_sheet(self.options.sheet_index))
            .with_prefix(&format!("Read spreadsheet '{}'", source.name))?;
        DataRegion::locate(period, sheet, &self.options.marker, &self.matchers)
    }

    /// Reads every reading of a file, collecting row errors instead of failing on them.
    pub fn extract(&self, source: &SourceFile) -> Result<Extraction, Gl860Error> {
        let region = self.region(source)?;
        let mut readings = Vec::new();
        let mut row_errors = Vec::new();
        for result in region.readings() {
            match result {
                Ok(reading) => readings.push(reading),
                Err(error) => {
                    warn!(file = %source.name, "Skipped {}", error);
                    row_errors.push(error);
                }
            }
        }

        let extraction = Extraction {
            file_name: source.name.to_owned(),
            period: region.period(),
            channels: region.channels().clone(),
            readings,
            rows_present: region.rows_present(),
            row_errors,
        };
        info!(
            file = %source.name,
            period = %extraction.period,
            channels = %extraction.channels,
            rows = extraction.rows_present,
            readings = extraction.readings.len(),
            row_errors = extraction.row_errors.len(),
            "Extracted readings"
        );
        Ok(extraction)
    }
}
