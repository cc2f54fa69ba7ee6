use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use laliga_tips::config::data_dir_from_env;
use laliga_tips::history;
use laliga_tips::star::BetDomain;

#[derive(Debug, Default)]
struct QueryArgs {
    db: Option<PathBuf>,
    domain: Option<BetDomain>,
    min_confidence: f64,
    limit: Option<usize>,
    day: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = parse_args()?;
    let db_path = args
        .db
        .clone()
        .or_else(|| data_dir_from_env().map(|dir| dir.join("history.sqlite")))
        .context("unable to resolve history sqlite path")?;
    if !db_path.exists() {
        return Err(anyhow!("no history yet at {}", db_path.display()));
    }

    let conn = history::open_db(&db_path)?;
    if let Some(day) = args.day {
        match history::load_digest_text(&conn, day)? {
            Some(text) => println!("{text}"),
            None => println!("No digest stored for {}.", day.format("%Y-%m-%d")),
        }
        return Ok(());
    }
    let picks = history::load_picks(&conn, args.domain, args.min_confidence, args.limit)?;

    println!("DB: {}", db_path.display());
    if picks.is_empty() {
        println!("No star picks match the filter.");
        return Ok(());
    }
    for item in &picks {
        let star = &item.record.star;
        println!(
            "{} #{} {:<8} {:>4.0}%  {} – {} ({})  {}",
            item.day.format("%Y-%m-%d"),
            item.position,
            star.domain.as_str(),
            star.confidence * 100.0,
            item.record.home,
            item.record.away,
            item.record.kickoff,
            star.pick
        );
    }
    println!("{} pick(s)", picks.len());
    Ok(())
}

fn parse_args() -> Result<QueryArgs> {
    let mut out = QueryArgs::default();
    for arg in std::env::args().skip(1) {
        if let Some(raw) = arg.strip_prefix("--type=") {
            out.domain = Some(
                BetDomain::parse(raw)
                    .ok_or_else(|| anyhow!("--type expects goals or cards, got {raw:?}"))?,
            );
        } else if let Some(raw) = arg.strip_prefix("--min-confidence=") {
            let value = raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("--min-confidence expects a number, got {raw:?}"))?;
            // Accept both 0.85 and 85.
            out.min_confidence = if value > 1.0 { value / 100.0 } else { value };
        } else if let Some(raw) = arg.strip_prefix("--limit=") {
            out.limit = Some(
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("--limit expects a count, got {raw:?}"))?,
            );
        } else if let Some(raw) = arg.strip_prefix("--day=") {
            out.day = Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("--day expects YYYY-MM-DD, got {raw:?}"))?,
            );
        } else if let Some(raw) = arg.strip_prefix("--db=") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                out.db = Some(PathBuf::from(trimmed));
            }
        } else {
            return Err(anyhow!(
                "unknown argument {arg:?} (usage: history [--type=goals|cards] [--min-confidence=0.85] [--limit=N] [--day=YYYY-MM-DD] [--db=PATH])"
            ));
        }
    }
    Ok(out)
}
