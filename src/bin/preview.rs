use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use laliga_tips::logging::init_logging;
use laliga_tips::memory_source::InMemoryStats;
use laliga_tips::report::compose_daily_digest;

// Offline rendering of a matchday table: no network, no history, no delivery.
fn main() -> Result<()> {
    init_logging();

    let mut path = PathBuf::from("demos/matchday.json");
    let mut day = None;
    let mut as_json = false;
    for arg in std::env::args().skip(1) {
        if let Some(raw) = arg.strip_prefix("--date=") {
            day = Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("--date expects YYYY-MM-DD, got {raw:?}"))?,
            );
        } else if arg == "--json" {
            as_json = true;
        } else {
            path = PathBuf::from(arg);
        }
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let stats = InMemoryStats::from_json_str(&raw)?;
    let day = day.unwrap_or_else(|| Local::now().date_naive());
    let digest = compose_daily_digest(day, &stats)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        println!("{}", digest.text);
    }
    Ok(())
}
