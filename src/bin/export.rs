use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

use mailrhythm::analytics::{
    bin_calendar, daily_count_distribution, CalendarFilter, CountDistribution, HourRange,
};
use mailrhythm::config::Config;
use mailrhythm::logging;
use mailrhythm::mail::{DateRange, Direction, DirectionSet, MailSource, MaildirSource};
use mailrhythm::tables::{export_all, RawCsvSource};

/// Write the raw, daily, weekly and weekday tables for an account
#[derive(Parser, Debug)]
#[command(name = "export", version)]
struct Args {
    /// Account from the config file (defaults to default_account)
    #[arg(short, long)]
    account: Option<String>,

    /// Re-export from an existing mail_raw.csv instead of the maildir
    #[arg(long, value_name = "CSV")]
    raw: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// First day to include (YYYY-MM-DD), overrides the config
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD), overrides the config
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Also write the calendar grid for this year as JSON
    #[arg(long, value_name = "YEAR")]
    calendar: Option<i32>,

    /// Restrict the calendar to the configured working hours
    #[arg(long, requires = "calendar")]
    work_hours: bool,

    /// Restrict the calendar to Monday through Friday
    #[arg(long, requires = "calendar")]
    weekdays_only: bool,
}

fn main() -> Result<()> {
    logging::init_stderr()?;
    let args = Args::parse();
    let config = Config::load();

    let configured = config.analysis.date_range();
    let range = DateRange::new(
        args.from.or(configured.start),
        args.to.or(configured.end),
    );

    let events = match &args.raw {
        Some(path) => RawCsvSource::new(path).fetch(&range)?,
        None => {
            let (name, account) = config
                .resolve_account(args.account.as_deref())
                .with_context(|| {
                    format!("No account found in {}", Config::config_path().display())
                })?;
            MaildirSource::from_account(name, account, &config.analysis).fetch(&range)?
        }
    };

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;
    let aggregates = export_all(&args.out, &events)?;
    println!(
        "Wrote {} events, {} daily rows, {} weekly rows to {}",
        events.len(),
        aggregates.per_day.len(),
        aggregates.per_week.len(),
        args.out.display()
    );

    let distributions: Vec<CountDistribution> = Direction::ALL
        .iter()
        .map(|&d| {
            daily_count_distribution(&aggregates.per_day, d, config.analysis.histogram_bins)
        })
        .collect();
    let path = args.out.join("mail_daily_distribution.json");
    std::fs::write(&path, serde_json::to_string_pretty(&distributions)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote mails-per-day distribution to {}", path.display());

    if let Some(year) = args.calendar {
        let hours: Option<HourRange> = if args.work_hours {
            Some(config.analysis.work_hours()?)
        } else {
            None
        };
        let filter = CalendarFilter {
            year,
            directions: DirectionSet::all(),
            hours,
            weekdays_only: args.weekdays_only,
        };
        let grid = bin_calendar(&events, &filter)?;
        let path = args.out.join(format!("mail_calendar_{}.json", year));
        let json = serde_json::to_string_pretty(&grid.export())?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote calendar {} ({} mails) to {}", year, grid.total(), path.display());
    }

    Ok(())
}
