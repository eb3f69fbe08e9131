//! # GL860 Loader
//!
//! Loads the spreadsheet exports of a GL860 weather data logger into DuckDB.
//!
//! The logger writes one `.xlsx` file per month, named `<prefix>_<YYMM>.xlsx`. Its first
//! sheet starts with device metadata, then a `Data` marker row, a field-name row, a unit row
//! and the readings. Columns are not fixed: which one holds temperature, humidity, irradiance,
//! illuminance or the logger's own temperature is inferred from the unit labels.
//!
//! ## Features
//!
//! - **Self-contained xlsx reader**: shared strings, date number formats and both date systems
//! - **Heuristic channel mapping**: ordered, replaceable [`extract::channel::ChannelMatcher`]s
//! - **Partial-row recovery**: rows with an unreadable timestamp are reported and skipped
//! - **Idempotent loading**: content fingerprints and `(timestamp, source_file)` keys
//!   make re-running an import harmless
//! - **Import log**: every attempt leaves a `SUCCESS` or `FAILED` entry
//! - **Verification**: per-month summaries, channel coverage and daily statistics

pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod helpers;
pub mod loader;
mod spreadsheet;

pub use crate::config::Config;
pub use crate::database::Store;
pub use crate::error::Gl860Error;
pub use crate::extract::Extractor;
pub use crate::helpers::source::SourceFile;
pub use crate::loader::Loader;
