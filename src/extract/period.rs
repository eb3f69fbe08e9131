use crate::extract::ExtractError;
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

/// `<prefix>_<YYMM>.xlsx`, e.g. `GL860 RAWDATA_2508.xlsx`
static PERIOD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.+_(\d{2})(\d{2})\.xlsx$").expect("Hardcode regex pattern"));

/// The calendar month a logger export covers, taken from its file name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Period> {
        (1..=12).contains(&month).then_some(Period { year, month })
    }

    /// Parses the `YYMM` token of a file name. Two-digit years are in the 2000s.
    ///
    /// # Errors
    /// `PeriodTokenError` when the name does not follow `<prefix>_<YYMM>.xlsx` or the month is
    /// outside 1–12.
    pub fn from_file_name(file_name: &str) -> Result<Period, ExtractError> {
        let invalid = || ExtractError::PeriodTokenError(file_name.to_owned());
        let captures = PERIOD_PATTERN.captures(file_name).ok_or_else(invalid)?;
        let year = captures[1].parse::<i32>().map_err(|_| invalid())?;
        let month = captures[2].parse::<u32>().map_err(|_| invalid())?;
        Period::new(2000 + year, month).ok_or_else(invalid)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_from_file_name() {
        assert_eq!(Period::from_file_name("GL860 RAWDATA_2508.xlsx").unwrap(), Period { year: 2025, month: 8 });
        assert_eq!(Period::from_file_name("site_a_2412.XLSX").unwrap(), Period { year: 2024, month: 12 });
        assert_eq!(Period::from_file_name("x_0001.xlsx").unwrap(), Period { year: 2000, month: 1 });
    }

    #[test]
    fn test_period_rejects_malformed_names() {
        for name in [
            "RAWDATA2508.xlsx",
            "_2508.xlsx",
            "RAWDATA_250.xlsx",
            "RAWDATA_25081.xlsx",
            "RAWDATA_2508.csv",
            "RAWDATA_2513.xlsx",
            "RAWDATA_2500.xlsx",
            "RAWDATA_25ab.xlsx",
        ] {
            assert!(
                matches!(Period::from_file_name(name), Err(ExtractError::PeriodTokenError(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period { year: 2025, month: 8 }.to_string(), "2025-08");
    }
}
