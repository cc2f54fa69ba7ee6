use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::api_parse::{
    parse_fixture_card_total_json, parse_fixture_ids_json, parse_fixtures_json, parse_paging,
    parse_player_lines_json, parse_recent_scores_json, parse_team_card_stats_json,
    parse_team_goal_stats_json,
};
use crate::config::ApiFootballConfig;
use crate::http_client::http_client;
use crate::players::rank_card_prone_players;
use crate::stats::{
    Fixture, PlayerCardFilter, PlayerCardStats, RefereeCardStats, StatSource, TeamCardStats,
    TeamRecentGoalStats, TeamSeasonGoalStats,
};

const API_FOOTBALL_BASE_URL: &str = "https://v3.football.api-sports.io";
const API_KEY_HEADER: &str = "x-apisports-key";
const MAX_PLAYER_PAGES: u32 = 6;

/// Blocking API-Football client scoped to one league and season.
///
/// `/teams/statistics` bodies are kept for the lifetime of the client so the
/// goals and cards lookups of a team share one request. A client is meant to
/// live for a single daily run.
pub struct ApiFootballClient {
    http: &'static Client,
    base_url: String,
    config: ApiFootballConfig,
    team_stats: RefCell<HashMap<u32, String>>,
}

impl ApiFootballClient {
    pub fn new(config: ApiFootballConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            base_url: API_FOOTBALL_BASE_URL.to_string(),
            config,
            team_stats: RefCell::new(HashMap::new()),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let url = Url::parse_with_params(&format!("{}{path}", self.base_url), params)
            .with_context(|| format!("invalid api-football url for {path}"))?;
        debug!(%url, "api-football request");

        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .with_context(|| format!("api-football request {path} failed"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading api-football body")?;
        if !status.is_success() {
            let snippet: String = body.chars().take(300).collect();
            return Err(anyhow!("api-football {path} http {status}: {snippet}"));
        }
        Ok(body)
    }

    fn league_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("league", self.config.league_id.to_string()),
            ("season", self.config.season.to_string()),
        ]
    }

    fn team_statistics(&self, team_id: u32) -> Result<String> {
        if let Some(body) = self.team_stats.borrow().get(&team_id) {
            return Ok(body.clone());
        }
        let mut params = self.league_params();
        params.push(("team", team_id.to_string()));
        let body = self.get("/teams/statistics", &params)?;
        self.team_stats.borrow_mut().insert(team_id, body.clone());
        Ok(body)
    }
}

impl StatSource for ApiFootballClient {
    fn season_goal_stats(&self, team_id: u32) -> Result<TeamSeasonGoalStats> {
        let body = self.team_statistics(team_id)?;
        let stats = parse_team_goal_stats_json(&body, self.config.over_source)
            .with_context(|| format!("team {team_id} goal statistics"))?;
        debug!(
            team_id,
            matches = stats.matches,
            over_0_5 = stats.over_0_5_rate,
            over_1_5 = stats.over_1_5_rate,
            "season goal stats"
        );
        Ok(stats)
    }

    fn recent_goal_stats(&self, team_id: u32, last_n: usize) -> Result<TeamRecentGoalStats> {
        let mut params = self.league_params();
        params.push(("team", team_id.to_string()));
        params.push(("last", last_n.to_string()));
        let body = self.get("/fixtures", &params)?;
        let scores = parse_recent_scores_json(&body, team_id)
            .with_context(|| format!("team {team_id} recent fixtures"))?;
        Ok(TeamRecentGoalStats::from_scores(&scores, last_n))
    }

    fn season_card_stats(&self, team_id: u32) -> Result<TeamCardStats> {
        let body = self.team_statistics(team_id)?;
        let stats = parse_team_card_stats_json(&body)
            .with_context(|| format!("team {team_id} card statistics"))?;
        if stats.matches == 0 {
            info!(team_id, "no matches recorded for team this season");
        } else {
            debug!(
                team_id,
                matches = stats.matches,
                yellow_total = stats.yellow_total,
                red_total = stats.red_total,
                weighted = stats.weighted_avg,
                "season card stats"
            );
        }
        Ok(stats)
    }

    fn referee_card_stats(&self, referee: &str, last_n: usize) -> Result<RefereeCardStats> {
        let mut params = self.league_params();
        params.push(("referee", referee.to_string()));
        params.push(("last", last_n.to_string()));
        let body = self.get("/fixtures", &params)?;
        let fixture_ids = parse_fixture_ids_json(&body).context("referee fixtures")?;

        let mut per_match = Vec::with_capacity(fixture_ids.len());
        for fixture_id in fixture_ids {
            let body = self.get("/fixtures/statistics", &[("fixture", fixture_id.to_string())])?;
            if let Some(total) = parse_fixture_card_total_json(&body)
                .with_context(|| format!("fixture {fixture_id} statistics"))?
            {
                per_match.push(total);
            }
        }

        let stats = RefereeCardStats::from_match_totals(referee, &per_match);
        debug!(
            referee,
            matches = stats.matches,
            avg = stats.total_cards_avg,
            "referee card stats"
        );
        Ok(stats)
    }

    fn player_card_stats(
        &self,
        team_id: u32,
        filter: PlayerCardFilter,
    ) -> Result<Vec<PlayerCardStats>> {
        let mut roster = Vec::new();
        let mut page = 1u32;
        loop {
            let params = [
                ("team", team_id.to_string()),
                ("season", self.config.season.to_string()),
                ("page", page.to_string()),
            ];
            let body = self.get("/players", &params)?;
            roster.extend(
                parse_player_lines_json(&body)
                    .with_context(|| format!("team {team_id} players page {page}"))?,
            );
            let (_, total_pages) = parse_paging(&body)?;
            if page >= total_pages || page >= MAX_PLAYER_PAGES {
                break;
            }
            page += 1;
        }
        Ok(rank_card_prone_players(&roster, filter))
    }

    fn fixtures_for_day(&self, day: NaiveDate) -> Result<Vec<Fixture>> {
        let mut params = self.league_params();
        params.push(("date", day.format("%Y-%m-%d").to_string()));
        let body = self.get("/fixtures", &params)?;
        let fixtures = parse_fixtures_json(&body).context("fixtures of the day")?;
        info!(%day, count = fixtures.len(), "fixtures loaded");
        Ok(fixtures)
    }
}
