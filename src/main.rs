mod argsets;
mod command;

use anyhow::{anyhow, Result};
use gl860_loader::helpers::logging::init_logging;
use gl860_loader::Config;
use std::path::PathBuf;

const CMD_IMPORT: &str = "import";
const CMD_WATCH: &str = "watch";
const CMD_VERIFY: &str = "verify";
const CMD_STATS: &str = "stats";

const DEFAULT_STATS_DAYS: usize = 7;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let mut config = Config::from_env()?;
    init_logging(&config.log_level);

    let mut args = pico_args::Arguments::from_env();
    let subcommand = args.subcommand()?;
    if let Some(database) = args.opt_value_from_str::<_, PathBuf>("--database")? {
        config.database_path = database;
    }

    match subcommand.as_deref() {
        Some(CMD_IMPORT) => {
            let import_args = argsets::ImportArgs {
                file: args.opt_value_from_str("--file")?,
                dir: args.opt_value_from_str("--dir")?,
                pattern: args.opt_value_from_str("--pattern")?,
                existing_month: args.opt_value_from_str("--existing-month")?,
                processed_dir: args.opt_value_from_str("--processed-dir")?,
            };
            reject_unused(args)?;
            command::import(&config, import_args)
        }
        Some(CMD_WATCH) => {
            let watch_args = argsets::WatchArgs {
                dir: args.opt_value_from_str("--dir")?,
                interval_secs: args.opt_value_from_str("--interval")?,
            };
            reject_unused(args)?;
            command::watch(&config, watch_args)
        }
        Some(CMD_VERIFY) => {
            reject_unused(args)?;
            command::verify(&config)
        }
        Some(CMD_STATS) => {
            let stats_args = argsets::StatsArgs {
                days: args.opt_value_from_str("--days")?.unwrap_or(DEFAULT_STATS_DAYS),
            };
            reject_unused(args)?;
            command::stats(&config, stats_args)
        }
        _ => Err(anyhow!("Subcommand must be one of 'import', 'watch', 'verify', 'stats'")),
    }
}

fn reject_unused(args: pico_args::Arguments) -> Result<()> {
    let remaining = args.finish();
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Unexpected arguments: {:?}", remaining))
    }
}
