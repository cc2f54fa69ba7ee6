use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::api_parse::OverRateSource;

const APP_DIR: &str = "laliga_tips";
const DEFAULT_LEAGUE_ID: u32 = 140;
const DEFAULT_SEASON: u32 = 2025;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiFootballConfig {
    pub api_key: String,
    pub league_id: u32,
    pub season: u32,
    pub over_source: OverRateSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_football: ApiFootballConfig,
    pub telegram: Option<TelegramConfig>,
    pub http_timeout_secs: u64,
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("API_FOOTBALL_KEY")
            .ok_or_else(|| anyhow!("missing API_FOOTBALL_KEY (set it in .env)"))?;
        let league_id = parse_or(
            get("API_FOOTBALL_LEAGUE_ID"),
            DEFAULT_LEAGUE_ID,
            "API_FOOTBALL_LEAGUE_ID",
        )?;
        let season = parse_or(get("API_FOOTBALL_SEASON"), DEFAULT_SEASON, "API_FOOTBALL_SEASON")?;
        let over_source = match get("API_FOOTBALL_OVER_SOURCE") {
            Some(raw) => OverRateSource::parse(&raw).ok_or_else(|| {
                anyhow!(
                    "unsupported API_FOOTBALL_OVER_SOURCE={raw}, expected auto, legacy or under_over"
                )
            })?,
            None => OverRateSource::Auto,
        };

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(anyhow!("TELEGRAM_BOT_TOKEN set without TELEGRAM_CHAT_ID"));
            }
            (None, Some(_)) => {
                return Err(anyhow!("TELEGRAM_CHAT_ID set without TELEGRAM_BOT_TOKEN"));
            }
        };

        let http_timeout_secs = get("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(2, 60);

        let data_dir = resolve_data_dir(&lookup);

        Ok(Self {
            api_football: ApiFootballConfig {
                api_key,
                league_id,
                season,
                over_source,
            },
            telegram,
            http_timeout_secs,
            data_dir,
        })
    }

    pub fn history_db_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("history.sqlite"))
    }

    pub fn last_run_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("last_run_date.txt"))
    }
}

/// Data directory without requiring provider credentials: `TIPS_DATA_DIR`,
/// then `$XDG_DATA_HOME/laliga_tips`, then `$HOME/.local/share/laliga_tips`.
pub fn resolve_data_dir(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    get("TIPS_DATA_DIR")
        .map(PathBuf::from)
        .or_else(|| get("XDG_DATA_HOME").map(|base| PathBuf::from(base).join(APP_DIR)))
        .or_else(|| {
            get("HOME").map(|home| PathBuf::from(home).join(".local").join("share").join(APP_DIR))
        })
}

pub fn data_dir_from_env() -> Option<PathBuf> {
    resolve_data_dir(|key| env::var(key).ok())
}

fn parse_or(raw: Option<String>, default: u32, key: &str) -> Result<u32> {
    match raw {
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| anyhow!("{key} must be a positive integer, got {v:?}")),
        None => Ok(default),
    }
}
