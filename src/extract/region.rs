use crate::error::Gl860Error;
use crate::extract::channel;
use crate::extract::channel::Channel;
use crate::extract::channel::ChannelMap;
use crate::extract::channel::ChannelMatcher;
use crate::extract::channel::Header;
use crate::extract::period::Period;
use crate::extract::reading::Reading;
use crate::extract::ExtractError;
use crate::extract::RowError;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::Rows;
use crate::spreadsheet::sheet::Sheet;
use std::collections::BTreeSet;
use tracing::debug;

/// Rows between the marker and the first reading: field names, then units.
const FIELD_ROW_OFFSET: usize = 1;
const UNIT_ROW_OFFSET: usize = 2;
const DATA_ROW_OFFSET: usize = 3;

/// The block of a worksheet below the data marker, with its columns identified.
#[derive(Debug)]
pub struct DataRegion {
    period: Period,
    sheet: Sheet,
    marker_row: usize,
    headers: Vec<Header>,
    timestamp: Header,
    channels: ChannelMap,
}

impl DataRegion {
    /// Finds the marker row and identifies the timestamp and channel columns.
    ///
    /// The marker is looked for in the leftmost populated column. Each column is labelled by
    /// its unit, falling back to its field name.
    ///
    /// # Errors
    /// * `DataMarkerError` when no row starts with `marker`
    /// * `TimestampColumnError` when no label mentions a time
    pub(crate) fn locate(
        period: Period,
        sheet: Sheet,
        marker: &str,
        matchers: &[Box<dyn ChannelMatcher>],
    ) -> Result<DataRegion, Gl860Error> {
        let first_col = sheet.col_lower_bound.unwrap_or(0);
        let marker_row = sheet
            .rows()
            .find(|row| row.get(first_col).is_some_and(|cell| cell.text() == marker))
            .map(|row| row.index)
            .ok_or_else(|| ExtractError::DataMarkerError(sheet.file_name.to_owned(), marker.to_owned()))?;

        let headers = read_headers(&sheet, marker_row);
        let timestamp = headers
            .iter()
            .find(|header| header.is_timestamp())
            .cloned()
            .ok_or_else(|| ExtractError::TimestampColumnError(sheet.file_name.to_owned()))?;
        let data_headers: Vec<Header> = headers
            .iter()
            .filter(|header| header.column != timestamp.column && !header.is_administrative())
            .cloned()
            .collect();
        let channels = channel::classify(&data_headers, matchers);
        debug!(
            file = %sheet.file_name,
            sheet = %sheet.name,
            marker_row = marker_row + 1,
            timestamp = %timestamp.label,
            %channels,
            "Located data region"
        );

        Ok(DataRegion {
            period,
            sheet,
            marker_row,
            headers,
            timestamp,
            channels,
        })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// All column labels in sheet order, timestamp and administrative columns included
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn timestamp_header(&self) -> &Header {
        &self.timestamp
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    /// Zero-based index of the first row that can hold a reading
    pub fn first_data_row(&self) -> usize {
        self.marker_row + DATA_ROW_OFFSET
    }

    /// Number of non-blank rows in the data block
    pub fn rows_present(&self) -> usize {
        self.sheet
            .rows_from(self.first_data_row())
            .filter(|row| !row.is_blank())
            .count()
    }

    /// Iterates the readings in sheet order.
    ///
    /// Rows without a timestamp are skipped. A row whose timestamp cannot be read yields a
    /// [`RowError`] and iteration goes on with the next row. Every call starts over from the
    /// first data row.
    pub fn readings(&self) -> Readings<'_> {
        Readings {
            region: self,
            rows: self.sheet.rows_from(self.first_data_row()),
        }
    }

    fn decode(&self, row: Row<'_>) -> Result<Option<Reading>, RowError> {
        let Some(cell) = row.get(self.timestamp.column).filter(|cell| !cell.is_blank()) else {
            return Ok(None);
        };
        let timestamp = cell.to_datetime().map_err(|message| RowError {
            row: row.index + 1,
            reference: cell.reference(),
            message,
        })?;

        let mut channels = [None; 5];
        for channel in Channel::ALL {
            channels[channel.index()] = self
                .channels
                .column(channel)
                .and_then(|column| row.get(column))
                .and_then(|cell| cell.to_double());
        }

        Ok(Some(Reading {
            year: self.period.year,
            month: self.period.month,
            timestamp,
            channels,
        }))
    }
}

/// Labels the columns present in the field-name or unit row below the marker.
///
/// A column takes its unit (`degC`, `%`, `W/m2`), or its field name where the unit cell is
/// empty, or `Unnamed: <n>` where both are. Repeated labels get a `.N` suffix.
fn read_headers(sheet: &Sheet, marker_row: usize) -> Vec<Header> {
    let field_row = sheet.row(marker_row + FIELD_ROW_OFFSET);
    let unit_row = sheet.row(marker_row + UNIT_ROW_OFFSET);
    let columns: BTreeSet<usize> = [field_row, unit_row]
        .iter()
        .flatten()
        .flat_map(|row| row.cells().iter().map(|cell| cell.col))
        .collect();
    let first_col = sheet.col_lower_bound.unwrap_or(0);

    let label_at = |row: Option<Row<'_>>, col: usize| {
        row.and_then(|row| row.get(col))
            .map(|cell| cell.text().to_owned())
            .filter(|label| !label.is_empty())
    };
    let mut headers: Vec<Header> = columns
        .into_iter()
        .map(|col| {
            let label = label_at(unit_row, col)
                .or_else(|| label_at(field_row, col))
                .unwrap_or_else(|| format!("Unnamed: {}", col - first_col));
            Header::new(col, &label)
        })
        .collect();
    channel::deduplicate_labels(&mut headers);
    headers
}

/// Lazy sequence of readings over a [`DataRegion`].
pub struct Readings<'a> {
    region: &'a DataRegion,
    rows: Rows<'a>,
}

impl Iterator for Readings<'_> {
    type Item = Result<Reading, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        for row in self.rows.by_ref() {
            match self.region.decode(row) {
                Ok(Some(reading)) => return Some(Ok(reading)),
                Ok(None) => continue,
                Err(error) => return Some(Err(error)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;
    use chrono::NaiveDateTime;

    const PERIOD: Period = Period { year: 2025, month: 8 };

    /// Builds a sheet from rows of `(kind, value)` pairs, `None` leaving the cell unpopulated.
    fn sheet(rows: &[Vec<Option<(CellType, &str)>>]) -> Sheet {
        let mut sheet = Sheet::new("GL860_2508.xlsx", "2508");
        for (row, cells) in rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if let Some((kind, value)) = cell {
                    sheet.push(Cell::new(row, col, *kind, value));
                }
            }
        }
        sheet.finish();
        sheet
    }

    fn t(value: &str) -> Option<(CellType, &str)> {
        Some((CellType::Text, value))
    }

    fn n(value: &str) -> Option<(CellType, &str)> {
        Some((CellType::Number, value))
    }

    fn logger_sheet(data: Vec<Vec<Option<(CellType, &'static str)>>>) -> Sheet {
        let mut rows = vec![
            vec![t("Title"), t("GL860")],
            vec![t("Sampling"), t("10min")],
            vec![t("Data")],
            vec![t("NO."), t("Date&Time"), t("CH1"), t("CH2"), t("CH3"), t("CH4"), t("CH5")],
            vec![None, t("Time"), t("degC"), t("%"), t("W/m2"), t("lux"), t("degC")],
        ];
        rows.extend(data);
        sheet(&rows)
    }

    fn locate(sheet: Sheet) -> Result<DataRegion, Gl860Error> {
        DataRegion::locate(PERIOD, sheet, "Data", &channel::default_matchers())
    }

    fn datetime(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_locate_logger_layout() {
        let region = locate(logger_sheet(vec![])).unwrap();

        assert_eq!(region.first_data_row(), 5);
        assert_eq!(region.timestamp_header(), &Header::new(1, "Time"));
        let labels: Vec<&str> = region.headers().iter().map(|header| header.label.as_str()).collect();
        assert_eq!(labels, vec!["NO.", "Time", "degC", "%", "W/m2", "lux", "degC.1"]);
        assert_eq!(region.channels().len(), 5);
        assert_eq!(region.channels().column(Channel::DeviceTemperature), Some(6));
        assert_eq!(region.rows_present(), 0);
        assert_eq!(region.readings().count(), 0);
    }

    #[test]
    fn test_readings_in_sheet_order() {
        let region = locate(logger_sheet(vec![
            vec![n("1"), t("2025/08/01 00:00:00"), n("24.5"), n("81"), n("0"), n("0"), n("25.1")],
            vec![n("2"), t("2025/08/01 00:10:00"), n("24.25"), n("82.5"), n("3.5"), n("120"), n("25.0")],
        ]))
        .unwrap();

        let readings: Vec<Reading> = region.readings().collect::<Result<_, _>>().unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].timestamp, datetime("2025-08-01 00:00:00"));
        assert_eq!(readings[0].channels, [Some(24.5), Some(81.0), Some(0.0), Some(0.0), Some(25.1)]);
        assert_eq!(readings[1].channel(Channel::Illuminance), Some(120.0));
        assert_eq!((readings[1].year, readings[1].month), (2025, 8));
    }

    #[test]
    fn test_readings_are_restartable() {
        let region = locate(logger_sheet(vec![
            vec![n("1"), t("2025/08/01 00:00:00"), n("24.5")],
            vec![n("2"), t("2025/08/01 00:10:00"), n("24.6")],
        ]))
        .unwrap();

        let first: Vec<_> = region.readings().collect();
        let second: Vec<_> = region.readings().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_row_without_timestamp_is_skipped_silently() {
        let region = locate(logger_sheet(vec![
            vec![n("1"), None, n("24.5")],
            vec![n("2"), t("  "), n("24.5")],
            vec![n("3"), t("2025/08/01 00:20:00"), n("24.7")],
        ]))
        .unwrap();

        let results: Vec<_> = region.readings().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().timestamp, datetime("2025-08-01 00:20:00"));
        assert_eq!(region.rows_present(), 3);
    }

    #[test]
    fn test_unreadable_timestamp_is_a_row_error() {
        let region = locate(logger_sheet(vec![
            vec![n("1"), t("2025/08/01 00:00:00"), n("24.5")],
            vec![n("2"), t("garbage"), n("24.5")],
            vec![n("3"), Some((CellType::Error, "#N/A")), n("24.5")],
            vec![n("4"), t("2025/08/01 00:30:00"), n("24.8")],
        ]))
        .unwrap();

        let results: Vec<_> = region.readings().collect();
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        let error = results[1].as_ref().unwrap_err();
        assert_eq!(error.row, 7);
        assert_eq!(error.reference, "B7");
        assert!(results[2].is_err());
        assert!(results[3].is_ok());
    }

    #[test]
    fn test_non_numeric_channel_becomes_null() {
        let region = locate(logger_sheet(vec![vec![
            n("1"),
            t("2025/08/01 00:00:00"),
            t("BURNOUT"),
            n("81"),
            None,
            Some((CellType::Error, "#VALUE!")),
            t(" 25.5 "),
        ]]))
        .unwrap();

        let reading = region.readings().next().unwrap().unwrap();
        assert_eq!(reading.channels, [None, Some(81.0), None, None, Some(25.5)]);
    }

    #[test]
    fn test_date_formatted_serial_timestamp() {
        let region = locate(logger_sheet(vec![vec![
            n("1"),
            Some((CellType::NumberDateTime1900, "45870.5")),
            n("30"),
        ]]))
        .unwrap();

        let reading = region.readings().next().unwrap().unwrap();
        assert_eq!(reading.timestamp, datetime("2025-08-01 12:00:00"));
    }

    #[test]
    fn test_field_name_fallback_and_unnamed_columns() {
        let region = locate(sheet(&[
            vec![t("Data")],
            vec![t("NO."), t("Date&Time"), t("Humidity"), None, t("Memo")],
            vec![None, None, t("%RH"), t("lux")],
        ]))
        .unwrap();

        let labels: Vec<&str> = region.headers().iter().map(|header| header.label.as_str()).collect();
        assert_eq!(labels, vec!["NO.", "Date&Time", "%RH", "lux", "Memo"]);
        assert_eq!(region.timestamp_header().column, 1);
        assert_eq!(region.channels().column(Channel::Humidity), Some(2));
        assert_eq!(region.channels().column(Channel::Illuminance), Some(3));
    }

    #[test]
    fn test_missing_marker() {
        let error = locate(sheet(&[
            vec![t("Title"), t("GL860")],
            vec![t("NO."), t("Time"), t("degC")],
        ]))
        .unwrap_err();
        assert!(matches!(error, Gl860Error::ExtractError(ExtractError::DataMarkerError(_, _))));
    }

    #[test]
    fn test_marker_must_be_in_first_column() {
        let error = locate(sheet(&[
            vec![t("Title"), t("Data")],
            vec![t("NO."), t("Time"), t("degC")],
        ]))
        .unwrap_err();
        assert!(matches!(error, Gl860Error::ExtractError(ExtractError::DataMarkerError(_, _))));
    }

    #[test]
    fn test_missing_timestamp_column() {
        let error = locate(sheet(&[
            vec![t("Data")],
            vec![t("NO."), t("CH1"), t("CH2")],
            vec![None, t("degC"), t("%")],
        ]))
        .unwrap_err();
        assert!(matches!(error, Gl860Error::ExtractError(ExtractError::TimestampColumnError(_))));
    }
}
