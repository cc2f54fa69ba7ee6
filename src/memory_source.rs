use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::players::rank_card_prone_players;
use crate::stats::{
    Fixture, PlayerCardFilter, PlayerCardStats, PlayerSeasonLine, RefereeCardStats, StatSource,
    TeamCardStats, TeamRecentGoalStats, TeamSeasonGoalStats, weighted_cards,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CardTotals {
    pub matches: u32,
    pub yellow: u32,
    pub red: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    #[serde(default)]
    pub season_goals: TeamSeasonGoalStats,
    // (goals_for, goals_against), most recent first.
    #[serde(default)]
    pub recent_scores: Vec<(u32, u32)>,
    #[serde(default)]
    pub cards: CardTotals,
    #[serde(default)]
    pub roster: Vec<PlayerSeasonLine>,
}

/// Offline stat table for one matchday. Feeds tests, the `preview` binary
/// and the benchmarks without touching the network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryStats {
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    #[serde(default)]
    pub teams: HashMap<u32, TeamRecord>,
    /// Per referee: (yellow, red) totals of each officiated match, most recent first.
    #[serde(default)]
    pub referees: HashMap<String, Vec<(u32, u32)>>,
}

impl InMemoryStats {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw.trim()).context("invalid offline stats json")
    }

    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.fixtures.push(fixture);
        self
    }

    pub fn with_team(mut self, team_id: u32, record: TeamRecord) -> Self {
        self.teams.insert(team_id, record);
        self
    }

    pub fn with_referee(mut self, name: &str, matches: Vec<(u32, u32)>) -> Self {
        self.referees.insert(name.to_string(), matches);
        self
    }

    fn team(&self, team_id: u32) -> Result<&TeamRecord> {
        self.teams
            .get(&team_id)
            .ok_or_else(|| anyhow!("no offline stats for team {team_id}"))
    }
}

impl StatSource for InMemoryStats {
    fn season_goal_stats(&self, team_id: u32) -> Result<TeamSeasonGoalStats> {
        Ok(self.team(team_id)?.season_goals)
    }

    fn recent_goal_stats(&self, team_id: u32, last_n: usize) -> Result<TeamRecentGoalStats> {
        let team = self.team(team_id)?;
        Ok(TeamRecentGoalStats::from_scores(&team.recent_scores, last_n))
    }

    fn season_card_stats(&self, team_id: u32) -> Result<TeamCardStats> {
        let cards = self.team(team_id)?.cards;
        Ok(TeamCardStats::from_totals(cards.matches, cards.yellow, cards.red))
    }

    fn referee_card_stats(&self, referee: &str, last_n: usize) -> Result<RefereeCardStats> {
        let per_match: Vec<u32> = self
            .referees
            .get(referee)
            .map(|rows| {
                rows.iter()
                    .take(last_n)
                    .map(|(yellow, red)| weighted_cards(*yellow, *red))
                    .collect()
            })
            .unwrap_or_default();
        Ok(RefereeCardStats::from_match_totals(referee, &per_match))
    }

    fn player_card_stats(
        &self,
        team_id: u32,
        filter: PlayerCardFilter,
    ) -> Result<Vec<PlayerCardStats>> {
        Ok(rank_card_prone_players(&self.team(team_id)?.roster, filter))
    }

    fn fixtures_for_day(&self, _day: NaiveDate) -> Result<Vec<Fixture>> {
        Ok(self.fixtures.clone())
    }
}
