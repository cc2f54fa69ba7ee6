use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cards::predict_cards;
use crate::fouls::fouls_block;
use crate::goals::predict_goals;
use crate::star::{BetDomain, StarBet, select_star_bet};
use crate::stats::{Fixture, StatSource};

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const NO_FIXTURES: &str = "Hoy no hay partidos de LaLiga programados.";

/// Structured counterpart of one fixture's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarPickRecord {
    pub home: String,
    pub away: String,
    pub kickoff: String,
    pub star: StarBet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub text: String,
    pub record: StarPickRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDigest {
    pub day: NaiveDate,
    pub text: String,
    pub picks: Vec<StarPickRecord>,
}

pub fn digest_title(day: NaiveDate) -> String {
    format!("🏆 LaLiga – Pronósticos ({})", day.format("%d/%m/%Y"))
}

pub fn compose_match_report(fixture: &Fixture, source: &dyn StatSource) -> Result<MatchReport> {
    let kickoff = fixture.kickoff_display();
    let goals = predict_goals(fixture, source).context("goals prediction")?;
    let cards = predict_cards(fixture, source).context("cards prediction")?;
    let star = select_star_bet(&goals, &cards);

    let lines = [
        SEPARATOR.to_string(),
        format!(
            "🟩 <b>{} – {}</b>  <i>({kickoff})</i>",
            fixture.home_team, fixture.away_team
        ),
        String::new(),
        goals.text,
        cards.text,
        fouls_block(),
        format!(
            "⭐ Apuesta estrella ({}): {}",
            star.domain.label(),
            star.pick
        ),
        "   💬 Basada en la probabilidad estadística de la línea seleccionada (goles/tarjetas)."
            .to_string(),
    ];

    Ok(MatchReport {
        text: lines.join("\n"),
        record: StarPickRecord {
            home: fixture.home_team.clone(),
            away: fixture.away_team.clone(),
            kickoff,
            star,
        },
    })
}

/// Composes the day's digest over an already fetched fixture list.
/// Fixtures are processed one at a time, in order.
pub fn compose_digest_for_fixtures(
    day: NaiveDate,
    fixtures: &[Fixture],
    source: &dyn StatSource,
) -> Result<DailyDigest> {
    let title = digest_title(day);
    if fixtures.is_empty() {
        return Ok(DailyDigest {
            day,
            text: format!("{title}\n\n{NO_FIXTURES}"),
            picks: Vec::new(),
        });
    }

    let mut blocks = vec![title, String::new()];
    let mut picks = Vec::with_capacity(fixtures.len());
    for (idx, fixture) in fixtures.iter().enumerate() {
        let report = compose_match_report(fixture, source).with_context(|| {
            format!("predictions for {} – {}", fixture.home_team, fixture.away_team)
        })?;
        blocks.push(format!("{}\u{fe0f}\u{20e3} {}", idx + 1, report.text));
        blocks.push(String::new());
        picks.push(report.record);
    }

    Ok(DailyDigest {
        day,
        text: blocks.join("\n").trim().to_string(),
        picks,
    })
}

pub fn compose_daily_digest(day: NaiveDate, source: &dyn StatSource) -> Result<DailyDigest> {
    let fixtures = source
        .fixtures_for_day(day)
        .with_context(|| format!("fixtures for {day}"))?;
    compose_digest_for_fixtures(day, &fixtures, source)
}

/// Document sent instead of the digest when the provider is unusable.
pub fn error_document(day: NaiveDate, err: &anyhow::Error) -> String {
    format!(
        "⚠️ Error generando pronósticos ({}): {err:#}",
        day.format("%d/%m/%Y")
    )
}

pub fn filter_picks<'a>(
    picks: &'a [StarPickRecord],
    domain: Option<BetDomain>,
    min_confidence: f64,
) -> Vec<&'a StarPickRecord> {
    picks
        .iter()
        .filter(|p| domain.is_none_or(|d| p.star.domain == d))
        .filter(|p| p.star.confidence >= min_confidence)
        .collect()
}
