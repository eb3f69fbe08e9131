//! Read-only summaries used to verify what has been loaded.

use crate::database::import_log;
use crate::database::import_log::ImportRecord;
use crate::database::Store;
use crate::error::Gl860Error;
use crate::extract::channel::Channel;
use chrono::NaiveDateTime;

const MONTH_SUMMARIES: &str = r"
SELECT year, month, count(*), min(record_time), max(record_time),
       round(avg(channel1_temperature), 2), round(avg(channel2_humidity), 2),
       count(channel5_device_temp)
FROM gl860_weather_data
GROUP BY year, month
ORDER BY year, month";

const CHANNEL_COVERAGE: &str = r"
SELECT count(*), count(channel1_temperature), count(channel2_humidity), count(channel3_uv),
       count(channel4_lux), count(channel5_device_temp)
FROM gl860_weather_data";

/// Stored readings of one export period.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub records: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub device_temperature_records: usize,
}

/// How many stored readings carry a value for each channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelCoverage {
    pub total: usize,
    pub populated: [usize; 5],
}

impl ChannelCoverage {
    pub fn populated(&self, channel: Channel) -> usize {
        self.populated[channel.index()]
    }

    /// Share of readings with a value, 0 when nothing is stored.
    pub fn percentage(&self, channel: Channel) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.populated(channel) as f64 * 100.0 / self.total as f64
        }
    }
}

impl Store {
    pub fn month_summaries(&self) -> Result<Vec<MonthSummary>, Gl860Error> {
        let mut statement = self.connection.prepare(MONTH_SUMMARIES)?;
        let summaries = statement.query_map([], |row| {
            Ok(MonthSummary {
                year: row.get(0)?,
                month: row.get::<_, i32>(1)? as u32,
                records: row.get::<_, i64>(2)? as usize,
                first: row.get(3)?,
                last: row.get(4)?,
                avg_temperature: row.get(5)?,
                avg_humidity: row.get(6)?,
                device_temperature_records: row.get::<_, i64>(7)? as usize,
            })
        })?;
        Ok(summaries.collect::<duckdb::Result<Vec<_>>>()?)
    }

    pub fn channel_coverage(&self) -> Result<ChannelCoverage, Gl860Error> {
        let coverage = self.connection.query_row(CHANNEL_COVERAGE, [], |row| {
            let mut populated = [0usize; 5];
            for (index, count) in populated.iter_mut().enumerate() {
                *count = row.get::<_, i64>(index + 1)? as usize;
            }
            Ok(ChannelCoverage {
                total: row.get::<_, i64>(0)? as usize,
                populated,
            })
        })?;
        Ok(coverage)
    }

    /// The latest import attempts, newest first.
    pub fn recent_imports(&self, limit: usize) -> Result<Vec<ImportRecord>, Gl860Error> {
        Ok(import_log::latest(&self.connection, limit)?)
    }
}
