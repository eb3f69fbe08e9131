use crate::extract::period::Period;
use crate::extract::reading::Reading;
use duckdb::params;
use duckdb::Connection;

const INSERT_IGNORING_DUPLICATES: &str = "INSERT OR IGNORE INTO gl860_weather_data (year, month, record_time, \
     source_file, channel1_temperature, channel2_humidity, channel3_uv, channel4_lux, channel5_device_temp) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Inserts every reading, silently dropping those whose `(record_time, source_file)` already exists.
pub(crate) fn insert_ignoring_duplicates(
    connection: &Connection,
    source_file: &str,
    readings: &[Reading],
) -> duckdb::Result<()> {
    let mut statement = connection.prepare(INSERT_IGNORING_DUPLICATES)?;
    for reading in readings {
        let [temperature, humidity, irradiance, illuminance, device_temperature] = reading.channels;
        statement.execute(params![
            reading.year,
            reading.month as i32,
            reading.timestamp,
            source_file,
            temperature,
            humidity,
            irradiance,
            illuminance,
            device_temperature,
        ])?;
    }
    Ok(())
}

/// Number of stored readings attributed to `source_file`.
pub(crate) fn count_for_file(connection: &Connection, source_file: &str) -> duckdb::Result<usize> {
    let count: i64 = connection.query_row(
        "SELECT count(*) FROM gl860_weather_data WHERE source_file = ?",
        params![source_file],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Number of stored readings for a period, whichever file they came from.
pub(crate) fn count_for_period(connection: &Connection, period: Period) -> duckdb::Result<usize> {
    let count: i64 = connection.query_row(
        "SELECT count(*) FROM gl860_weather_data WHERE year = ? AND month = ?",
        params![period.year, period.month as i32],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}
