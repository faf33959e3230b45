use std::time::Instant;

use mailrhythm::analytics::{aggregate, available_years, bin_calendar, CalendarFilter};
use mailrhythm::config::Config;
use mailrhythm::mail::{cache, MaildirSource};

fn main() {
    let clear_cache = std::env::args().any(|a| a == "--clear-cache");
    let account = std::env::args().skip(1).find(|a| !a.starts_with("--"));

    let config = Config::load();
    let Some((name, account)) = config.resolve_account(account.as_deref()) else {
        eprintln!("No account configured in {}", Config::config_path().display());
        return;
    };

    if clear_cache {
        if let Some(cache_file) = cache::cache_path(name) {
            let _ = std::fs::remove_file(&cache_file);
            println!("Cleared cache");
        }
    }

    let source = MaildirSource::from_account(name, account, &config.analysis);
    println!("Scanning: {}", source.root().display());
    println!(
        "Available parallelism: {:?}",
        std::thread::available_parallelism()
    );

    let start = Instant::now();
    let events = match source.scan(&config.analysis.date_range(), |current, total| {
        if current % 5000 == 0 {
            println!("Scan progress: {}/{}", current, total);
        }
    }) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    let scan_duration = start.elapsed();
    println!("Scanned {} events in {:?}", events.len(), scan_duration);
    println!(
        "Rate: {:.0} emails/sec",
        events.len() as f64 / scan_duration.as_secs_f64()
    );

    println!("\nAggregating...");
    let agg_start = Instant::now();
    let aggregates = aggregate(&events);
    println!(
        "{} days, {} weeks in {:?}",
        aggregates.per_day.len(),
        aggregates.per_week.len(),
        agg_start.elapsed()
    );

    println!("\nBinning calendars...");
    let bin_start = Instant::now();
    for year in available_years(&events) {
        match bin_calendar(&events, &CalendarFilter::year(year)) {
            Ok(grid) => println!(
                "  {}: {} mails, busiest day {}",
                year,
                grid.total(),
                grid.max_count()
            ),
            Err(e) => println!("  {}: {}", year, e),
        }
    }
    println!("Binned in {:?}", bin_start.elapsed());

    println!("\nTotal: {:?}", start.elapsed());
}
