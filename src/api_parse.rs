//! Normalization of API-Football response bodies into typed stat records.
//!
//! Every parser takes the raw body text so fixtures on disk can be fed
//! straight in. Missing or oddly typed fields degrade to zero rather than
//! failing the whole record; a body without the `response` envelope is an
//! error.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::stats::{
    Fixture, PlayerSeasonLine, TeamCardStats, TeamSeasonGoalStats, weighted_cards,
};

/// Where season over 0.5 / over 1.5 counts are read from in `/teams/statistics`.
/// The provider shape for these counts is not stable across plans, so the
/// extraction is selectable; when nothing matches the rates fall back to 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverRateSource {
    /// `goals.for.total.over_0_5` / `over_1_5`, either a number or `{ "total": n }`.
    Legacy,
    /// `goals.for.under_over."0.5".over` / `."1.5".over`.
    UnderOver,
    /// Legacy first, then under/over.
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverCounts {
    pub over_0_5: u32,
    pub over_1_5: u32,
}

impl OverRateSource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "legacy" => Some(Self::Legacy),
            "under_over" | "underover" => Some(Self::UnderOver),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn extract(self, stats: &Value) -> Option<OverCounts> {
        let goals_for = stats.get("goals").and_then(|g| g.get("for"))?;
        match self {
            Self::Legacy => legacy_over_counts(goals_for),
            Self::UnderOver => under_over_counts(goals_for),
            Self::Auto => legacy_over_counts(goals_for).or_else(|| under_over_counts(goals_for)),
        }
    }
}

fn legacy_over_counts(goals_for: &Value) -> Option<OverCounts> {
    let totals = goals_for.get("total")?;
    let read = |key: &str| {
        totals.get(key).and_then(|v| {
            if v.is_object() {
                v.get("total").and_then(as_u32_any)
            } else {
                as_u32_any(v)
            }
        })
    };
    let over_0_5 = read("over_0_5");
    let over_1_5 = read("over_1_5");
    if over_0_5.is_none() && over_1_5.is_none() {
        return None;
    }
    Some(OverCounts {
        over_0_5: over_0_5.unwrap_or(0),
        over_1_5: over_1_5.unwrap_or(0),
    })
}

fn under_over_counts(goals_for: &Value) -> Option<OverCounts> {
    let table = goals_for.get("under_over")?;
    let read = |line: &str| table.get(line).and_then(|v| v.get("over")).and_then(as_u32_any);
    let over_0_5 = read("0.5");
    let over_1_5 = read("1.5");
    if over_0_5.is_none() && over_1_5.is_none() {
        return None;
    }
    Some(OverCounts {
        over_0_5: over_0_5.unwrap_or(0),
        over_1_5: over_1_5.unwrap_or(0),
    })
}

/// Parses the body and returns its `response` member.
pub fn response_payload(raw: &str) -> Result<Value> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid api-football json")?;
    let Value::Object(mut map) = root else {
        return Err(anyhow!("unexpected api-football payload: not an object"));
    };
    if let Some(errors) = map.get("errors").filter(|e| has_errors(e)) {
        return Err(anyhow!("api-football reported errors: {errors}"));
    }
    map.remove("response")
        .ok_or_else(|| anyhow!("unexpected api-football payload: missing response"))
}

/// `(current, total)` page numbers; a body without paging counts as a single page.
pub fn parse_paging(raw: &str) -> Result<(u32, u32)> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid api-football json")?;
    let paging = root.get("paging");
    let current = paging
        .and_then(|p| p.get("current"))
        .and_then(as_u32_any)
        .unwrap_or(1);
    let total = paging
        .and_then(|p| p.get("total"))
        .and_then(as_u32_any)
        .unwrap_or(1);
    Ok((current, total.max(current)))
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let response = response_payload(raw)?;
    let mut out = Vec::new();
    for item in response.as_array().map(Vec::as_slice).unwrap_or_default() {
        let fixture = item.get("fixture").unwrap_or(&Value::Null);
        let teams = item.get("teams").unwrap_or(&Value::Null);
        let home = teams.get("home").unwrap_or(&Value::Null);
        let away = teams.get("away").unwrap_or(&Value::Null);

        out.push(Fixture {
            fixture_id: fixture.get("id").and_then(as_u64_any),
            home_team_id: home.get("id").and_then(as_u32_any),
            away_team_id: away.get("id").and_then(as_u32_any),
            home_team: str_field(home, "name").unwrap_or_default(),
            away_team: str_field(away, "name").unwrap_or_default(),
            kickoff: str_field(fixture, "date"),
            referee: str_field(fixture, "referee"),
        });
    }
    Ok(out)
}

pub fn parse_team_goal_stats_json(
    raw: &str,
    source: OverRateSource,
) -> Result<TeamSeasonGoalStats> {
    let stats = response_payload(raw)?;
    let played = played_total(&stats);
    let goals = stats.get("goals").unwrap_or(&Value::Null);
    let average = |side: &str| {
        goals
            .get(side)
            .and_then(|s| s.get("average"))
            .and_then(|a| a.get("total"))
            .and_then(as_f64_any)
            .unwrap_or(0.0)
    };
    let over = source.extract(&stats).unwrap_or_default();
    Ok(TeamSeasonGoalStats::from_counts(
        played,
        average("for"),
        average("against"),
        over.over_0_5,
        over.over_1_5,
    ))
}

pub fn parse_team_card_stats_json(raw: &str) -> Result<TeamCardStats> {
    let stats = response_payload(raw)?;
    let played = played_total(&stats);
    let cards = stats.get("cards").unwrap_or(&Value::Null);
    let yellow = sum_minute_buckets(cards.get("yellow"));
    let red = sum_minute_buckets(cards.get("red"));
    Ok(TeamCardStats::from_totals(played, yellow, red))
}

/// `(goals_for, goals_against)` from `team_id`'s point of view, in response
/// order. Fixtures without the team or without a usable score are skipped.
pub fn parse_recent_scores_json(raw: &str, team_id: u32) -> Result<Vec<(u32, u32)>> {
    let response = response_payload(raw)?;
    let mut out = Vec::new();
    for item in response.as_array().map(Vec::as_slice).unwrap_or_default() {
        let teams = item.get("teams").unwrap_or(&Value::Null);
        let home_id = teams.get("home").and_then(|t| t.get("id")).and_then(as_u32_any);
        let away_id = teams.get("away").and_then(|t| t.get("id")).and_then(as_u32_any);
        let goals = item.get("goals").unwrap_or(&Value::Null);
        let (Some(home_goals), Some(away_goals)) = (
            goals.get("home").and_then(as_u32_any),
            goals.get("away").and_then(as_u32_any),
        ) else {
            continue;
        };

        if home_id == Some(team_id) {
            out.push((home_goals, away_goals));
        } else if away_id == Some(team_id) {
            out.push((away_goals, home_goals));
        }
    }
    Ok(out)
}

pub fn parse_fixture_ids_json(raw: &str) -> Result<Vec<u64>> {
    let response = response_payload(raw)?;
    Ok(response
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|item| item.get("fixture")?.get("id").and_then(as_u64_any))
        .collect())
}

/// Weighted card total (both teams) of one fixture, or `None` when the
/// statistics do not list two teams.
pub fn parse_fixture_card_total_json(raw: &str) -> Result<Option<u32>> {
    let response = response_payload(raw)?;
    let teams = response.as_array().map(Vec::as_slice).unwrap_or_default();
    if teams.len() < 2 {
        return Ok(None);
    }
    let total = teams[..2]
        .iter()
        .map(|team| {
            let stats = team
                .get("statistics")
                .and_then(|s| s.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default();
            weighted_cards(
                stat_value(stats, "Yellow Cards"),
                stat_value(stats, "Red Cards"),
            )
        })
        .fold(0u32, u32::saturating_add);
    Ok(Some(total))
}

pub fn parse_player_lines_json(raw: &str) -> Result<Vec<PlayerSeasonLine>> {
    let response = response_payload(raw)?;
    let mut out = Vec::new();
    for item in response.as_array().map(Vec::as_slice).unwrap_or_default() {
        let Some(stats) = item
            .get("statistics")
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
        else {
            continue;
        };
        let name = item
            .get("player")
            .and_then(|p| str_field(p, "name"))
            .unwrap_or_else(|| "Jugador".to_string());
        let games = stats.get("games").unwrap_or(&Value::Null);
        let cards = stats.get("cards").unwrap_or(&Value::Null);
        out.push(PlayerSeasonLine {
            name,
            // API-Football spells it this way.
            matches: games.get("appearences").and_then(as_u32_any).unwrap_or(0),
            yellow: cards.get("yellow").and_then(as_u32_any).unwrap_or(0),
            red: cards.get("red").and_then(as_u32_any).unwrap_or(0),
        });
    }
    Ok(out)
}

fn played_total(stats: &Value) -> u32 {
    stats
        .get("fixtures")
        .and_then(|f| f.get("played"))
        .and_then(|p| p.get("total"))
        .and_then(as_u32_any)
        .unwrap_or(0)
}

fn sum_minute_buckets(buckets: Option<&Value>) -> u32 {
    let Some(map) = buckets.and_then(|b| b.as_object()) else {
        return 0;
    };
    map.values()
        .filter_map(|bucket| bucket.get("total").and_then(as_u32_any))
        .fold(0u32, u32::saturating_add)
}

fn stat_value(stats: &[Value], kind: &str) -> u32 {
    stats
        .iter()
        .find(|entry| entry.get("type").and_then(|t| t.as_str()) == Some(kind))
        .and_then(|entry| entry.get("value"))
        .and_then(as_u32_any)
        .unwrap_or(0)
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    u32::try_from(as_u64_any(v)?).ok()
}

fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}
