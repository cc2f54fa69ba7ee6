use anyhow::{Context, Result};

use crate::prediction::{PredictionBlock, pct};
use crate::stats::{Fixture, StatSource, TeamRecentGoalStats, TeamSeasonGoalStats};

pub const RECENT_FORM_MATCHES: usize = 10;

pub const OVER_0_5_PICK: &str = "Más de 0.5 goles";
pub const OVER_1_5_PICK: &str = "Más de 1.5 goles";
pub const UNDER_3_5_PICK: &str = "Menos de 3.5 goles";

const OVER_0_5_THRESHOLD: f64 = 0.90;
const OVER_1_5_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyWeights {
    pub season: f64,
    pub recent: f64,
}

/// Fewer recent matches means noisier form, so the season share grows.
pub fn recency_weights(recent_matches: u32) -> RecencyWeights {
    let (season, recent) = match recent_matches {
        n if n >= 8 => (0.5, 0.5),
        n if n >= 5 => (0.6, 0.4),
        n if n >= 3 => (0.7, 0.3),
        _ => (0.8, 0.2),
    };
    RecencyWeights { season, recent }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamGoalSignals {
    pub season: TeamSeasonGoalStats,
    pub recent: TeamRecentGoalStats,
}

impl TeamGoalSignals {
    pub fn fetch(source: &dyn StatSource, team_id: u32) -> Result<Self> {
        let season = source
            .season_goal_stats(team_id)
            .with_context(|| format!("season goal stats for team {team_id}"))?;
        let recent = source
            .recent_goal_stats(team_id, RECENT_FORM_MATCHES)
            .with_context(|| format!("recent goal stats for team {team_id}"))?;
        Ok(Self { season, recent })
    }

    /// Blended (over 0.5, over 1.5) rates for this team.
    pub fn blended_rates(&self) -> (f64, f64) {
        let w = recency_weights(self.recent.matches);
        let over_0_5 = self.season.over_0_5_rate * w.season + self.recent.over_0_5_rate * w.recent;
        let over_1_5 = self.season.over_1_5_rate * w.season + self.recent.over_1_5_rate * w.recent;
        (over_0_5, over_1_5)
    }
}

/// Match-level (over 0.5, over 1.5) rates: the mean of both teams' blended rates.
pub fn combined_rates(home: &TeamGoalSignals, away: &TeamGoalSignals) -> (f64, f64) {
    let (h05, h15) = home.blended_rates();
    let (a05, a15) = away.blended_rates();
    ((h05 + a05) / 2.0, (h15 + a15) / 2.0)
}

pub fn predict_goals(fixture: &Fixture, source: &dyn StatSource) -> Result<PredictionBlock> {
    let (Some(home_id), Some(away_id)) = (fixture.home_team_id, fixture.away_team_id) else {
        return Ok(PredictionBlock::no_bet(
            "🔹 Goles: Sin datos suficientes de los equipos en API-Football",
            "No se han encontrado IDs válidos de equipo para este partido.",
        ));
    };

    let home = TeamGoalSignals::fetch(source, home_id)?;
    let away = TeamGoalSignals::fetch(source, away_id)?;
    Ok(goals_block(&fixture.home_team, &fixture.away_team, &home, &away))
}

pub fn goals_block(
    home_name: &str,
    away_name: &str,
    home: &TeamGoalSignals,
    away: &TeamGoalSignals,
) -> PredictionBlock {
    let (over_0_5, over_1_5) = combined_rates(home, away);
    let recent_span = format!(
        "       • Últimos {} y {} partidos: ",
        home.recent.matches, away.recent.matches
    );

    if over_0_5 >= OVER_0_5_THRESHOLD {
        let lines = vec![
            "🔹 Goles: Más de 0.5 goles en el partido".to_string(),
            format!(
                "   💬 {home_name} y {away_name} presentan un porcentaje combinado altísimo de partidos con gol."
            ),
            format!(
                "       • Temporada: {} / {} over 0.5",
                pct(home.season.over_0_5_rate),
                pct(away.season.over_0_5_rate)
            ),
            format!(
                "{recent_span}{} / {} over 0.5.",
                pct(home.recent.over_0_5_rate),
                pct(away.recent.over_0_5_rate)
            ),
        ];
        return PredictionBlock::new(lines, Some(OVER_0_5_PICK.to_string()), 0.95);
    }

    if over_1_5 >= OVER_1_5_THRESHOLD {
        let lines = vec![
            "🔹 Goles: Más de 1.5 goles en el partido".to_string(),
            "   💬 El % combinado de over 1.5 es sólido considerando temporada y forma reciente."
                .to_string(),
            format!(
                "       • Temporada: {} / {} over 1.5",
                pct(home.season.over_1_5_rate),
                pct(away.season.over_1_5_rate)
            ),
            format!(
                "{recent_span}{} / {} over 1.5.",
                pct(home.recent.over_1_5_rate),
                pct(away.recent.over_1_5_rate)
            ),
        ];
        return PredictionBlock::new(lines, Some(OVER_1_5_PICK.to_string()), 0.85);
    }

    let lines = vec![
        "🔹 Goles: Menos de 3.5 goles en el partido".to_string(),
        "   💬 Tendencia moderada en goles según temporada y forma reciente.".to_string(),
        format!(
            "       • Temporada: {:.2} / {:.2} goles totales de media",
            home.season.total_goals_avg(),
            away.season.total_goals_avg()
        ),
        format!(
            "{recent_span}{:.2} / {:.2} goles totales de media.",
            home.recent.total_goals_avg(),
            away.recent.total_goals_avg()
        ),
        "       Preferimos una línea conservadora a la baja (under 3.5).".to_string(),
    ];
    PredictionBlock::new(lines, Some(UNDER_3_5_PICK.to_string()), 0.65)
}
