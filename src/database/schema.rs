//! Tables the loader creates on first use.

pub(crate) const CREATE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS gl860_weather_data (
    year INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    record_time TIMESTAMP NOT NULL,
    source_file VARCHAR NOT NULL,
    channel1_temperature DOUBLE,
    channel2_humidity DOUBLE,
    channel3_uv DOUBLE,
    channel4_lux DOUBLE,
    channel5_device_temp DOUBLE,
    PRIMARY KEY (record_time, source_file)
);

CREATE SEQUENCE IF NOT EXISTS import_logs_id_seq START 1;

CREATE TABLE IF NOT EXISTS import_logs (
    id BIGINT PRIMARY KEY DEFAULT nextval('import_logs_id_seq'),
    filename VARCHAR NOT NULL,
    file_hash VARCHAR NOT NULL,
    records_imported BIGINT NOT NULL DEFAULT 0,
    records_skipped BIGINT NOT NULL DEFAULT 0,
    status VARCHAR NOT NULL CHECK (status IN ('SUCCESS', 'FAILED')),
    error_message VARCHAR,
    date_range_start DATE,
    date_range_end DATE,
    import_time TIMESTAMP NOT NULL,
    retryable BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS gl860_daily_statistics (
    date DATE NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    day INTEGER NOT NULL,
    avg_temperature DOUBLE,
    max_temperature DOUBLE,
    min_temperature DOUBLE,
    avg_humidity DOUBLE,
    max_humidity DOUBLE,
    min_humidity DOUBLE,
    avg_device_temp DOUBLE,
    temperature_delta DOUBLE,
    humidity_delta DOUBLE,
    record_count BIGINT NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
";
