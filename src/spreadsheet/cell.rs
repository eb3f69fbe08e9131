use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Text layouts accepted for timestamps stored as strings.
/// `%.f` also matches when the fractional part is absent.
const TEXT_DATETIME_FORMATS: [&str; 5] = [
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
];

const MILLISECONDS_PER_DAY: f64 = 86_400_000.0;

/// Types of cell data in a worksheet.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `0`/`1`
    Boolean,
    /// Numeric values without a date/time number format
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Index into the shared string table, resolved to `Text` while reading
    SharedString,
    /// Literal text
    Text,
    /// Error values such as `#N/A`
    Error,
}

impl CellType {
    /// Maps the built-in number format IDs that denote dates or times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::date_time(is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::date(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::time(is_1904)),
            _ => None,
        }
    }

    /// Classifies a custom number format code by the date and time tokens outside
    /// quoted literals, escapes, and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::date_time(is_1904),
            (true, false) => Self::date(is_1904),
            (false, true) => Self::time(is_1904),
            (false, false) => Self::Number,
        }
    }

    fn date_time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }
    }

    fn date(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }
    }

    fn time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }
    }

    /// Whether the value is a serial number in the 1900 or 1904 date system.
    fn serial_epoch(self) -> Option<bool> {
        match self {
            Self::NumberDateTime1900 | Self::NumberDate1900 | Self::NumberTime1900 => Some(false),
            Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904 => Some(true),
            _ => None,
        }
    }

    fn is_numeric(self) -> bool {
        self == Self::Number || self.serial_epoch().is_some()
    }
}

/// A single populated cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value as stored in the worksheet, shared strings already resolved
    pub(crate) value: String,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize, kind: CellType, value: &str) -> Cell {
        Cell {
            row,
            col,
            kind,
            value: value.to_owned(),
        }
    }

    /// Returns the A1-style reference of the cell, e.g. `"B7"`.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// True when the cell holds nothing but whitespace.
    pub(crate) fn is_blank(&self) -> bool {
        self.kind == CellType::Empty || self.value.trim().is_empty()
    }

    /// Trimmed textual value.
    pub(crate) fn text(&self) -> &str {
        self.value.trim()
    }

    /// Reads the cell as a finite number.
    ///
    /// Text holding a number (`" 23.5"`) is accepted. Booleans, errors, non-numeric text and
    /// non-finite values such as `NaN` give `None`.
    pub(crate) fn to_double(&self) -> Option<f64> {
        let value = match self.kind {
            kind if kind.is_numeric() => self.text().parse::<f64>().ok(),
            CellType::Text => self.text().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|value| value.is_finite())
    }

    /// Reads the cell as a timestamp.
    ///
    /// Date-formatted numbers are converted from their serial value, ISO cells and text are
    /// parsed against the accepted layouts. Plain numbers are rejected because nothing marks
    /// them as dates.
    pub(crate) fn to_datetime(&self) -> Result<NaiveDateTime, String> {
        if let Some(is_1904) = self.kind.serial_epoch() {
            let serial = self
                .text()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a date serial", self.value))?;
            return serial_to_datetime(serial, is_1904)
                .ok_or_else(|| format!("date serial {} is out of range", self.value));
        }

        match self.kind {
            CellType::IsoDateTime | CellType::Text => parse_datetime_text(self.text())
                .ok_or_else(|| format!("'{}' is not a recognised timestamp", self.value)),
            CellType::Error => Err(format!("error value {}", self.value)),
            CellType::Number => Err(format!("number {} has no date format", self.value)),
            _ => Err(format!("'{}' is not a timestamp", self.value)),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CellType::Boolean => write!(f, "{}", self.value == "1"),
            kind if kind.serial_epoch().is_some() => match self.to_datetime() {
                Ok(datetime) => write!(f, "{}", datetime),
                Err(_) => write!(f, "{}", self.value),
            },
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Converts a spreadsheet date serial to a timestamp rounded to the millisecond.
///
/// In the 1900 system serial 60 is the nonexistent 1900-02-29, so serials below it count
/// from 1899-12-31 and the rest from 1899-12-30.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    }?;

    let milliseconds = (serial * MILLISECONDS_PER_DAY).round();
    if !milliseconds.is_finite() || milliseconds.abs() > 1.0e15 {
        return None;
    }
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(milliseconds as i64))
}

fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    TEXT_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}
