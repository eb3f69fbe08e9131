use crate::database::DatabaseError;
use crate::database::Store;
use crate::error::Gl860Error;
use chrono::NaiveDate;
use duckdb::params;
use tracing::info;

const REBUILD_DAILY_STATISTICS: &str = r"
INSERT INTO gl860_daily_statistics
SELECT CAST(record_time AS DATE) AS date,
       year(CAST(record_time AS DATE)),
       month(CAST(record_time AS DATE)),
       day(CAST(record_time AS DATE)),
       round(avg(channel1_temperature), 2),
       round(max(channel1_temperature), 2),
       round(min(channel1_temperature), 2),
       round(avg(channel2_humidity), 2),
       round(max(channel2_humidity), 2),
       round(min(channel2_humidity), 2),
       round(avg(channel5_device_temp), 2),
       round(max(channel1_temperature) - min(channel1_temperature), 2),
       round(max(channel2_humidity) - min(channel2_humidity), 2),
       count(*),
       CAST(? AS TIMESTAMP)
FROM gl860_weather_data
GROUP BY CAST(record_time AS DATE)";

const SELECT_DAILY_STATISTICS: &str = r"
SELECT date, avg_temperature, max_temperature, min_temperature, avg_humidity, max_humidity,
       min_humidity, avg_device_temp, temperature_delta, humidity_delta, record_count
FROM gl860_daily_statistics
ORDER BY date DESC";

/// Aggregates of one calendar day of readings.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyStatistics {
    pub date: NaiveDate,
    pub avg_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub min_humidity: Option<f64>,
    pub avg_device_temperature: Option<f64>,
    /// Daily temperature range, max minus min
    pub temperature_delta: Option<f64>,
    /// Daily humidity range, max minus min
    pub humidity_delta: Option<f64>,
    pub records: usize,
}

impl Store {
    /// Recomputes the daily statistics table from every stored reading.
    /// Runs in one transaction, so readers never see a half-built table.
    pub fn refresh_daily_statistics(&mut self) -> Result<usize, Gl860Error> {
        let days = self
            .try_refresh_daily_statistics()
            .map_err(|error| DatabaseError::PersistenceError("gl860_daily_statistics".to_owned(), error))?;
        info!(days, "Refreshed daily statistics");
        Ok(days)
    }

    fn try_refresh_daily_statistics(&mut self) -> duckdb::Result<usize> {
        let transaction = self.connection.transaction()?;
        transaction.execute("DELETE FROM gl860_daily_statistics", [])?;
        let days = transaction.execute(REBUILD_DAILY_STATISTICS, params![chrono::Local::now().naive_local()])?;
        transaction.commit()?;
        Ok(days)
    }

    /// The `limit` most recent days, newest first.
    pub fn daily_statistics(&self, limit: usize) -> Result<Vec<DailyStatistics>, Gl860Error> {
        let sql = format!("{SELECT_DAILY_STATISTICS} LIMIT {limit}");
        let mut statement = self.connection.prepare(&sql)?;
        let days = statement.query_map([], |row| {
            Ok(DailyStatistics {
                date: row.get(0)?,
                avg_temperature: row.get(1)?,
                max_temperature: row.get(2)?,
                min_temperature: row.get(3)?,
                avg_humidity: row.get(4)?,
                max_humidity: row.get(5)?,
                min_humidity: row.get(6)?,
                avg_device_temperature: row.get(7)?,
                temperature_delta: row.get(8)?,
                humidity_delta: row.get(9)?,
                records: row.get::<_, i64>(10)? as usize,
            })
        })?;
        Ok(days.collect::<duckdb::Result<Vec<_>>>()?)
    }
}
