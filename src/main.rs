use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use laliga_tips::api_football::ApiFootballClient;
use laliga_tips::config::Settings;
use laliga_tips::delivery::TelegramClient;
use laliga_tips::history;
use laliga_tips::logging::init_logging;
use laliga_tips::report::{DailyDigest, compose_daily_digest, error_document};
use laliga_tips::run_guard::RunGuard;

#[derive(Debug, Default)]
struct RunArgs {
    date: Option<NaiveDate>,
    force: bool,
    dry_run: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let args = parse_args()?;
    let settings = Settings::from_env()?;
    let day = args.date.unwrap_or_else(|| Local::now().date_naive());

    let guard = settings.last_run_path().map(RunGuard::new);
    if !args.force
        && !args.dry_run
        && let Some(guard) = guard.as_ref()
        && guard.already_ran(day)?
    {
        info!(%day, marker = %guard.path().display(), "digest already produced today, skipping");
        return Ok(());
    }
    // Marked before composing; a crashed run still counts.
    if !args.dry_run
        && let Some(guard) = guard.as_ref()
    {
        guard.mark(day)?;
    }

    let (text, digest) = match build_digest(&settings, day) {
        Ok(digest) => {
            info!(%day, fixtures = digest.picks.len(), "digest composed");
            (digest.text.clone(), Some(digest))
        }
        Err(err) => {
            error!(%day, error = %format!("{err:#}"), "digest failed");
            (error_document(day, &err), None)
        }
    };

    println!("{text}");
    if args.dry_run {
        return Ok(());
    }

    if let Some(digest) = digest.as_ref() {
        save_history(&settings, digest);
    }

    match settings.telegram.clone() {
        Some(telegram) => {
            let client = TelegramClient::new(telegram, settings.http_timeout_secs)?;
            let delivered = client.send(&text)?;
            if delivered == 0 {
                warn!("no telegram chunk was accepted");
            }
        }
        None => info!("telegram not configured, printed only"),
    }
    Ok(())
}

fn build_digest(settings: &Settings, day: NaiveDate) -> Result<DailyDigest> {
    let client = ApiFootballClient::new(settings.api_football.clone(), settings.http_timeout_secs)?;
    compose_daily_digest(day, &client)
}

/// History is best effort; a failing store never blocks delivery.
fn save_history(settings: &Settings, digest: &DailyDigest) {
    let Some(path) = settings.history_db_path() else {
        warn!("no data directory resolved, history not saved");
        return;
    };
    let saved =
        history::open_db(&path).and_then(|mut conn| history::save_digest(&mut conn, digest));
    if let Err(err) = saved {
        warn!(path = %path.display(), error = %format!("{err:#}"), "history save failed");
    }
}

fn parse_args() -> Result<RunArgs> {
    let mut out = RunArgs::default();
    for arg in std::env::args().skip(1) {
        if let Some(raw) = arg.strip_prefix("--date=") {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("--date expects YYYY-MM-DD, got {raw:?}"))?;
            out.date = Some(date);
        } else if arg == "--force" {
            out.force = true;
        } else if arg == "--dry-run" {
            out.dry_run = true;
        } else {
            return Err(anyhow!(
                "unknown argument {arg:?} (usage: laliga_tips [--date=YYYY-MM-DD] [--force] [--dry-run])"
            ));
        }
    }
    Ok(out)
}
