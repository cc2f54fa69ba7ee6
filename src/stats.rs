use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// One scheduled league match as returned by the fixtures lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub fixture_id: Option<u64>,
    #[serde(default)]
    pub home_team_id: Option<u32>,
    #[serde(default)]
    pub away_team_id: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    // Provider ISO-8601 timestamp, kept raw so a malformed value can still be shown.
    #[serde(default)]
    pub kickoff: Option<String>,
    #[serde(default)]
    pub referee: Option<String>,
}

impl Fixture {
    pub fn kickoff_display(&self) -> String {
        let Some(raw) = self.kickoff.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return "Hora por confirmar".to_string();
        };
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => dt.format("%H:%M").to_string(),
            Err(_) => raw.to_string(),
        }
    }

    /// Trimmed referee name; blank names count as "not assigned yet".
    pub fn referee_name(&self) -> Option<&str> {
        self.referee
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonGoalStats {
    pub matches: u32,
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub over_0_5_rate: f64,
    pub over_1_5_rate: f64,
}

impl TeamSeasonGoalStats {
    /// Rates are `count / matches`, clamped into [0, 1]. Zero matches zeroes every rate.
    pub fn from_counts(
        matches: u32,
        goals_for_avg: f64,
        goals_against_avg: f64,
        over_0_5_count: u32,
        over_1_5_count: u32,
    ) -> Self {
        if matches == 0 {
            return Self {
                goals_for_avg: goals_for_avg.max(0.0),
                goals_against_avg: goals_against_avg.max(0.0),
                ..Self::default()
            };
        }
        Self {
            matches,
            goals_for_avg: goals_for_avg.max(0.0),
            goals_against_avg: goals_against_avg.max(0.0),
            over_0_5_rate: rate(over_0_5_count, matches),
            over_1_5_rate: rate(over_1_5_count, matches),
        }
    }

    pub fn total_goals_avg(&self) -> f64 {
        self.goals_for_avg + self.goals_against_avg
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecentGoalStats {
    pub matches: u32,
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub over_0_5_rate: f64,
    pub over_1_5_rate: f64,
}

impl TeamRecentGoalStats {
    /// Builds recent form from `(goals_for, goals_against)` pairs, most recent first.
    /// Only the first `last_n` pairs are used.
    pub fn from_scores(scores: &[(u32, u32)], last_n: usize) -> Self {
        let sample = &scores[..scores.len().min(last_n)];
        if sample.is_empty() {
            return Self::default();
        }
        let matches = sample.len() as u32;
        let mut goals_for = 0u32;
        let mut goals_against = 0u32;
        let mut over_0_5 = 0u32;
        let mut over_1_5 = 0u32;
        for (gf, ga) in sample {
            goals_for = goals_for.saturating_add(*gf);
            goals_against = goals_against.saturating_add(*ga);
            let total = gf.saturating_add(*ga);
            if total >= 1 {
                over_0_5 += 1;
            }
            if total >= 2 {
                over_1_5 += 1;
            }
        }
        let n = matches as f64;
        Self {
            matches,
            goals_for_avg: goals_for as f64 / n,
            goals_against_avg: goals_against as f64 / n,
            over_0_5_rate: rate(over_0_5, matches),
            over_1_5_rate: rate(over_1_5, matches),
        }
    }

    pub fn total_goals_avg(&self) -> f64 {
        self.goals_for_avg + self.goals_against_avg
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamCardStats {
    pub matches: u32,
    pub yellow_total: u32,
    pub red_total: u32,
    pub yellow_avg: f64,
    pub red_avg: f64,
    pub weighted_avg: f64,
}

impl TeamCardStats {
    pub fn from_totals(matches: u32, yellow_total: u32, red_total: u32) -> Self {
        if matches == 0 {
            return Self::default();
        }
        let n = matches as f64;
        let yellow_avg = yellow_total as f64 / n;
        let red_avg = red_total as f64 / n;
        Self {
            matches,
            yellow_total,
            red_total,
            yellow_avg,
            red_avg,
            weighted_avg: yellow_avg + 2.0 * red_avg,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefereeCardStats {
    pub name: String,
    pub matches: u32,
    pub total_cards_avg: f64,
}

impl RefereeCardStats {
    /// `per_match` holds the weighted card total (both teams) of each sampled match.
    pub fn from_match_totals(name: &str, per_match: &[u32]) -> Self {
        let matches = per_match.len() as u32;
        let total_cards_avg = if matches == 0 {
            0.0
        } else {
            per_match.iter().map(|&n| f64::from(n)).sum::<f64>() / matches as f64
        };
        Self {
            name: name.to_string(),
            matches,
            total_cards_avg,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCardStats {
    pub name: String,
    pub matches: u32,
    pub yellow: u32,
    pub red: u32,
    pub total_cards: u32,
    pub cards_per_match: f64,
}

/// Raw season line of one roster player, before the propensity filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonLine {
    pub name: String,
    pub matches: u32,
    pub yellow: u32,
    pub red: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerCardFilter {
    pub top_n: usize,
    pub min_matches: u32,
    pub min_cards: u32,
}

impl Default for PlayerCardFilter {
    fn default() -> Self {
        Self {
            top_n: 3,
            min_matches: 5,
            min_cards: 3,
        }
    }
}

/// Yellow plus two points per red, used for teams and referees alike.
/// Saturates on absurd provider counts.
pub fn weighted_cards(yellow: u32, red: u32) -> u32 {
    yellow.saturating_add(red.saturating_mul(2))
}

/// Lookups the prediction core depends on. Every call may fail; callers decide
/// whether a failure degrades a section or aborts the fixture.
pub trait StatSource {
    fn season_goal_stats(&self, team_id: u32) -> Result<TeamSeasonGoalStats>;
    fn recent_goal_stats(&self, team_id: u32, last_n: usize) -> Result<TeamRecentGoalStats>;
    fn season_card_stats(&self, team_id: u32) -> Result<TeamCardStats>;
    fn referee_card_stats(&self, referee: &str, last_n: usize) -> Result<RefereeCardStats>;
    fn player_card_stats(
        &self,
        team_id: u32,
        filter: PlayerCardFilter,
    ) -> Result<Vec<PlayerCardStats>>;
    fn fixtures_for_day(&self, day: NaiveDate) -> Result<Vec<Fixture>>;
}

fn rate(count: u32, matches: u32) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    (count as f64 / matches as f64).clamp(0.0, 1.0)
}
