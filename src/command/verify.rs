use crate::argsets::StatsArgs;
use anyhow::Result;
use gl860_loader::extract::channel::Channel;
use gl860_loader::Config;

const RECENT_IMPORTS: usize = 10;

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("{:.2}", value))
}

pub fn verify(config: &Config) -> Result<()> {
    let store = super::open_store(config)?;

    println!("Monthly summary");
    for month in store.month_summaries()? {
        println!(
            "  {:04}-{:02}  {:>6} records  {} .. {}  avg {} degC  avg {} %  device temp {}",
            month.year,
            month.month,
            month.records,
            month.first,
            month.last,
            format_value(month.avg_temperature),
            format_value(month.avg_humidity),
            month.device_temperature_records
        );
    }

    let coverage = store.channel_coverage()?;
    println!("Channel coverage ({} records)", coverage.total);
    for channel in Channel::ALL {
        println!(
            "  {} {:<20} {:>6} ({:.1}%)",
            channel,
            channel.label(),
            coverage.populated(channel),
            coverage.percentage(channel)
        );
    }

    println!("Recent imports");
    for record in store.recent_imports(RECENT_IMPORTS)? {
        let range = record
            .date_range
            .map_or_else(|| "-".to_owned(), |(start, end)| format!("{} .. {}", start, end));
        println!(
            "  {}  {:<7} {}  imported {}  duplicates {}  {}{}",
            record.import_time.format("%Y-%m-%d %H:%M:%S"),
            record.status.as_str(),
            record.filename,
            record.records_imported,
            record.records_skipped,
            range,
            record.error_message.map(|message| format!("  {}", message)).unwrap_or_default()
        );
    }
    Ok(())
}

pub fn stats(config: &Config, args: StatsArgs) -> Result<()> {
    let mut store = super::open_store(config)?;
    let days = store.refresh_daily_statistics()?;
    println!("Daily statistics rebuilt for {} day(s)", days);

    for day in store.daily_statistics(args.days)? {
        println!(
            "  {}  temp {} [{} .. {}] delta {}  humidity {} [{} .. {}] delta {}  device {}  {} records",
            day.date,
            format_value(day.avg_temperature),
            format_value(day.min_temperature),
            format_value(day.max_temperature),
            format_value(day.temperature_delta),
            format_value(day.avg_humidity),
            format_value(day.min_humidity),
            format_value(day.max_humidity),
            format_value(day.humidity_delta),
            format_value(day.avg_device_temperature),
            day.records
        );
    }
    Ok(())
}
