use anyhow::{Context, Result};
use tracing::warn;

use crate::players::describe_players;
use crate::prediction::PredictionBlock;
use crate::stats::{
    Fixture, PlayerCardFilter, PlayerCardStats, RefereeCardStats, StatSource, TeamCardStats,
};

pub const REFEREE_SAMPLE_MATCHES: usize = 15;
pub const CARD_PRONE_PLAYERS_PER_TEAM: usize = 2;

const LOW_CARDS_CUTOFF: f64 = 3.0;
const LOW_CARDS_CONFIDENCE: f64 = 0.4;
const MIN_CONFIDENCE: f64 = 0.4;
const MAX_CONFIDENCE: f64 = 0.95;

const STRICT_REFEREE_AVG: f64 = 6.5;
const LENIENT_REFEREE_AVG: f64 = 4.0;
const REFEREE_NUDGE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLine {
    pub line: f64,
    pub confidence: f64,
}

impl CardLine {
    pub fn pick(&self) -> String {
        format!("Más de {:.1} tarjetas totales", self.line)
    }
}

/// Line ladder over the combined weighted average. `None` below the
/// conservative cutoff: thin signal never gets a line.
pub fn select_card_line(combined_weighted: f64) -> Option<CardLine> {
    if combined_weighted < LOW_CARDS_CUTOFF {
        return None;
    }
    let (line, confidence) = if combined_weighted >= 7.0 {
        (5.5, 0.85)
    } else if combined_weighted >= 5.5 {
        (4.5, 0.80)
    } else if combined_weighted >= 4.0 {
        (3.5, 0.70)
    } else {
        (3.5, 0.55)
    };
    Some(CardLine { line, confidence })
}

pub fn referee_adjustment(total_cards_avg: f64) -> f64 {
    if total_cards_avg >= STRICT_REFEREE_AVG {
        REFEREE_NUDGE
    } else if total_cards_avg <= LENIENT_REFEREE_AVG {
        -REFEREE_NUDGE
    } else {
        0.0
    }
}

/// Snaps to hundredths, then clamps into the card band. Confidences are
/// compared and filtered as two-decimal values downstream.
pub fn clamp_confidence(confidence: f64) -> f64 {
    ((confidence * 100.0).round() / 100.0).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefereeInfo {
    Unassigned,
    NoData(String),
    Known(RefereeCardStats),
}

impl RefereeInfo {
    /// A failed or empty lookup degrades to `NoData`; it never aborts the block.
    pub fn lookup(source: &dyn StatSource, referee: Option<&str>) -> Self {
        let Some(name) = referee else {
            return Self::Unassigned;
        };
        match source.referee_card_stats(name, REFEREE_SAMPLE_MATCHES) {
            Ok(stats) if stats.matches > 0 => Self::Known(stats),
            Ok(_) => Self::NoData(name.to_string()),
            Err(err) => {
                warn!(referee = name, error = %err, "referee card lookup failed");
                Self::NoData(name.to_string())
            }
        }
    }

    fn lines(&self) -> [String; 2] {
        match self {
            Self::Known(stats) => [
                format!("   👨‍⚖️ Árbitro: {}", stats.name),
                format!(
                    "       • Media de {:.2} tarjetas por partido en sus últimos {} encuentros de liga.",
                    stats.total_cards_avg, stats.matches
                ),
            ],
            Self::NoData(name) => [
                format!("   👨‍⚖️ Árbitro: {name}"),
                "       • No hay suficientes datos recientes en la API para estimar su media de tarjetas."
                    .to_string(),
            ],
            Self::Unassigned => [
                "   👨‍⚖️ Árbitro: Por confirmar".to_string(),
                "       • La API todavía no proporciona el árbitro asignado a este partido."
                    .to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardPronePlayers {
    pub home: Vec<PlayerCardStats>,
    pub away: Vec<PlayerCardStats>,
}

impl CardPronePlayers {
    /// Both teams or nothing: a failure on either side drops the section.
    pub fn lookup(source: &dyn StatSource, home_id: u32, away_id: u32) -> Self {
        let filter = PlayerCardFilter {
            top_n: CARD_PRONE_PLAYERS_PER_TEAM,
            ..PlayerCardFilter::default()
        };
        let fetched = source
            .player_card_stats(home_id, filter)
            .and_then(|home| Ok((home, source.player_card_stats(away_id, filter)?)));
        match fetched {
            Ok((home, away)) => Self { home, away },
            Err(err) => {
                warn!(home_id, away_id, error = %err, "card-prone player lookup failed");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }
}

pub fn predict_cards(fixture: &Fixture, source: &dyn StatSource) -> Result<PredictionBlock> {
    let (Some(home_id), Some(away_id)) = (fixture.home_team_id, fixture.away_team_id) else {
        return Ok(PredictionBlock::no_bet(
            "🔹 Tarjetas: Sin datos suficientes de los equipos en API-Football",
            "Faltan IDs válidos de equipo para poder calcular tarjetas.",
        ));
    };

    let home = source
        .season_card_stats(home_id)
        .with_context(|| format!("season card stats for team {home_id}"))?;
    let away = source
        .season_card_stats(away_id)
        .with_context(|| format!("season card stats for team {away_id}"))?;

    if home.matches == 0 || away.matches == 0 {
        return Ok(insufficient_season_block());
    }

    let referee = RefereeInfo::lookup(source, fixture.referee_name());
    let players = CardPronePlayers::lookup(source, home_id, away_id);
    Ok(cards_block(
        &fixture.home_team,
        &fixture.away_team,
        &home,
        &away,
        &referee,
        &players,
    ))
}

pub fn cards_block(
    home_name: &str,
    away_name: &str,
    home: &TeamCardStats,
    away: &TeamCardStats,
    referee: &RefereeInfo,
    players: &CardPronePlayers,
) -> PredictionBlock {
    if home.matches == 0 || away.matches == 0 {
        return insufficient_season_block();
    }

    let combined_weighted = home.weighted_avg + away.weighted_avg;
    let mut lines = Vec::new();

    let (candidate, mut confidence) = match select_card_line(combined_weighted) {
        None => {
            lines.push("🔹 Tarjetas: Partido a priori de pocas tarjetas".to_string());
            lines.push(
                "   💬 Las medias de tarjetas de ambos equipos son bajas en la temporada actual."
                    .to_string(),
            );
            lines.push(format!(
                "       • {home_name}: {:.2} amarillas y {:.2} rojas de media",
                home.yellow_avg, home.red_avg
            ));
            lines.push(format!(
                "       • {away_name}: {:.2} amarillas y {:.2} rojas de media",
                away.yellow_avg, away.red_avg
            ));
            lines.push(
                "       Preferimos no forzar una línea alta de tarjetas en este encuentro."
                    .to_string(),
            );
            (None, LOW_CARDS_CONFIDENCE)
        }
        Some(card_line) => {
            lines.push(format!(
                "🔹 Tarjetas: Más de {:.1} tarjetas totales",
                card_line.line
            ));
            lines.push(format!(
                "   💬 En la temporada actual, los partidos de {home_name} y {away_name} acumulan una media combinada cercana a {combined_weighted:.2} tarjetas por partido ({home_name}: {:.2}, {away_name}: {:.2}).",
                home.weighted_avg, away.weighted_avg
            ));
            (Some(card_line.pick()), card_line.confidence)
        }
    };

    lines.extend(referee.lines());
    if let RefereeInfo::Known(stats) = referee
        && candidate.is_some()
    {
        confidence += referee_adjustment(stats.total_cards_avg);
    }
    let confidence = clamp_confidence(confidence);

    if !players.is_empty() {
        lines.push("   🧨 Jugadores propensos a tarjeta:".to_string());
        if !players.home.is_empty() {
            lines.push(format!(
                "       • {home_name}: {}",
                describe_players(&players.home)
            ));
        }
        if !players.away.is_empty() {
            lines.push(format!(
                "       • {away_name}: {}",
                describe_players(&players.away)
            ));
        }
    }

    PredictionBlock::new(lines, candidate, confidence)
}

fn insufficient_season_block() -> PredictionBlock {
    PredictionBlock::no_bet(
        "🔹 Tarjetas: Sin datos suficientes de la temporada",
        "Alguno de los equipos tiene 0 partidos registrados en la temporada actual.",
    )
}
