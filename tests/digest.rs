use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use laliga_tips::cards::predict_cards;
use laliga_tips::memory_source::{CardTotals, InMemoryStats, TeamRecord};
use laliga_tips::report::{
    StarPickRecord, compose_daily_digest, compose_match_report, error_document, filter_picks,
};
use laliga_tips::star::{BetDomain, NO_GOALS_PICK, StarBet};
use laliga_tips::stats::{
    Fixture, PlayerCardFilter, PlayerCardStats, PlayerSeasonLine, RefereeCardStats, StatSource,
    TeamCardStats, TeamRecentGoalStats, TeamSeasonGoalStats,
};

fn matchday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 6).unwrap()
}

fn fixture(home: (u32, &str), away: (u32, &str), referee: Option<&str>) -> Fixture {
    Fixture {
        fixture_id: Some(1_390_900 + home.0 as u64),
        home_team_id: Some(home.0),
        away_team_id: Some(away.0),
        home_team: home.1.to_string(),
        away_team: away.1.to_string(),
        kickoff: Some("2025-12-06T21:00:00+01:00".to_string()),
        referee: referee.map(str::to_string),
    }
}

/// Scores every match, two cards a game.
fn free_scoring_team() -> TeamRecord {
    TeamRecord {
        season_goals: TeamSeasonGoalStats::from_counts(10, 2.0, 1.0, 10, 8),
        recent_scores: vec![(2, 1); 10],
        cards: CardTotals { matches: 10, yellow: 20, red: 0 },
        roster: Vec::new(),
    }
}

/// Tight games, two cards a game.
fn low_scoring_team() -> TeamRecord {
    TeamRecord {
        season_goals: TeamSeasonGoalStats::from_counts(10, 1.0, 1.0, 7, 3),
        recent_scores: vec![
            (1, 0),
            (0, 0),
            (1, 1),
            (0, 0),
            (2, 0),
            (0, 0),
            (1, 0),
            (0, 1),
            (0, 0),
            (1, 1),
        ],
        cards: CardTotals { matches: 10, yellow: 20, red: 0 },
        roster: Vec::new(),
    }
}

struct FlakySource {
    inner: InMemoryStats,
    fail_referee: bool,
    fail_players_for: Option<u32>,
    fail_team_cards: bool,
}

impl FlakySource {
    fn new(inner: InMemoryStats) -> Self {
        Self {
            inner,
            fail_referee: false,
            fail_players_for: None,
            fail_team_cards: false,
        }
    }
}

impl StatSource for FlakySource {
    fn season_goal_stats(&self, team_id: u32) -> Result<TeamSeasonGoalStats> {
        self.inner.season_goal_stats(team_id)
    }

    fn recent_goal_stats(&self, team_id: u32, last_n: usize) -> Result<TeamRecentGoalStats> {
        self.inner.recent_goal_stats(team_id, last_n)
    }

    fn season_card_stats(&self, team_id: u32) -> Result<TeamCardStats> {
        if self.fail_team_cards {
            return Err(anyhow!("statistics endpoint unavailable"));
        }
        self.inner.season_card_stats(team_id)
    }

    fn referee_card_stats(&self, referee: &str, last_n: usize) -> Result<RefereeCardStats> {
        if self.fail_referee {
            return Err(anyhow!("referee lookup timed out"));
        }
        self.inner.referee_card_stats(referee, last_n)
    }

    fn player_card_stats(
        &self,
        team_id: u32,
        filter: PlayerCardFilter,
    ) -> Result<Vec<PlayerCardStats>> {
        if self.fail_players_for == Some(team_id) {
            return Err(anyhow!("players page 2 failed"));
        }
        self.inner.player_card_stats(team_id, filter)
    }

    fn fixtures_for_day(&self, day: NaiveDate) -> Result<Vec<Fixture>> {
        self.inner.fixtures_for_day(day)
    }
}

#[test]
fn empty_matchday_reports_no_fixtures() {
    let digest = compose_daily_digest(matchday(), &InMemoryStats::default()).unwrap();
    assert_eq!(
        digest.text,
        "🏆 LaLiga – Pronósticos (06/12/2025)\n\nHoy no hay partidos de LaLiga programados."
    );
    assert!(digest.picks.is_empty());
}

#[test]
fn certain_scorers_make_goals_the_star_even_against_strong_cards() {
    let stats = InMemoryStats::default()
        .with_fixture(fixture((1, "Barcelona"), (2, "Girona"), Some("Estricto")))
        .with_team(1, free_scoring_team())
        .with_team(2, free_scoring_team())
        .with_referee("Estricto", vec![(6, 1); 5]);

    let digest = compose_daily_digest(matchday(), &stats).unwrap();
    assert!(digest.text.contains("🔹 Goles: Más de 0.5 goles en el partido"));
    assert!(digest.text.contains("⭐ Apuesta estrella (goles): Más de 0.5 goles"));

    let star = &digest.picks[0].star;
    assert_eq!(star.domain, BetDomain::Goals);
    assert_eq!(star.confidence, 0.95);
}

#[test]
fn cards_take_the_star_when_goals_are_conservative() {
    let stats = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), None))
        .with_team(3, low_scoring_team())
        .with_team(4, low_scoring_team());

    let report = compose_match_report(&stats.fixtures[0], &stats).unwrap();
    assert!(report.text.contains("🔹 Goles: Menos de 3.5 goles en el partido"));
    assert!(report.text.contains("🔹 Tarjetas: Más de 3.5 tarjetas totales"));
    assert!(report.text.contains("👨‍⚖️ Árbitro: Por confirmar"));
    assert!(report.text.contains("🔹 Faltas: Más de 22.5 faltas totales"));
    assert!(
        report
            .text
            .contains("⭐ Apuesta estrella (tarjetas): Más de 3.5 tarjetas totales")
    );

    let star = &report.record.star;
    assert_eq!(star.domain, BetDomain::Cards);
    assert_eq!(star.pick, "Más de 3.5 tarjetas totales");
    assert_eq!(star.confidence, 0.70);
    assert_eq!(report.record.kickoff, "21:00");
}

#[test]
fn strict_referee_nudges_card_confidence() {
    let stats = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), Some("Estricto")))
        .with_team(3, low_scoring_team())
        .with_team(4, low_scoring_team())
        .with_referee("Estricto", vec![(6, 1); 5]);

    let report = compose_match_report(&stats.fixtures[0], &stats).unwrap();
    assert!(report.text.contains("👨‍⚖️ Árbitro: Estricto"));
    assert!(report.text.contains("Media de 8.00 tarjetas por partido en sus últimos 5"));
    assert!((report.record.star.confidence - 0.75).abs() < 1e-9);
}

#[test]
fn lenient_referee_card_line_passes_the_matching_confidence_filter() {
    let stats = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), Some("Permisivo")))
        .with_team(3, low_scoring_team())
        .with_team(4, low_scoring_team())
        .with_referee("Permisivo", vec![(3, 0); 6]);

    let cards = predict_cards(&stats.fixtures[0], &stats).unwrap();
    assert_eq!(cards.confidence, 0.65);

    let record = StarPickRecord {
        home: "Sevilla".to_string(),
        away: "Getafe".to_string(),
        kickoff: "21:00".to_string(),
        star: StarBet {
            domain: BetDomain::Cards,
            pick: cards.candidate.clone().unwrap(),
            confidence: cards.confidence,
        },
    };
    assert_eq!(filter_picks(&[record], Some(BetDomain::Cards), 0.65).len(), 1);

    // Equal to the conservative goals line, so goals keeps the star.
    let digest = compose_daily_digest(matchday(), &stats).unwrap();
    assert_eq!(digest.picks[0].star.domain, BetDomain::Goals);
}

#[test]
fn payload_matches_the_text_in_order() {
    let stats = InMemoryStats::default()
        .with_fixture(fixture((1, "Barcelona"), (2, "Girona"), None))
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), None))
        .with_team(1, free_scoring_team())
        .with_team(2, free_scoring_team())
        .with_team(3, low_scoring_team())
        .with_team(4, low_scoring_team());

    let digest = compose_daily_digest(matchday(), &stats).unwrap();
    assert_eq!(digest.picks.len(), 2);
    assert!(digest.text.starts_with("🏆 LaLiga – Pronósticos (06/12/2025)"));

    let first = digest.text.find("1\u{fe0f}\u{20e3} ").expect("first entry numbered");
    let second = digest.text.find("2\u{fe0f}\u{20e3} ").expect("second entry numbered");
    assert!(first < second);

    for pick in &digest.picks {
        let line = format!(
            "⭐ Apuesta estrella ({}): {}",
            pick.star.domain.label(),
            pick.star.pick
        );
        assert!(digest.text.contains(&line), "missing star line {line:?}");
    }
    assert_eq!(digest.picks[0].home, "Barcelona");
    assert_eq!(digest.picks[1].away, "Getafe");

    let strong_cards = filter_picks(&digest.picks, Some(BetDomain::Cards), 0.7);
    assert_eq!(strong_cards.len(), 1);
    assert_eq!(strong_cards[0].home, "Sevilla");

    let json = serde_json::to_value(&digest).unwrap();
    assert_eq!(json["picks"][0]["star"]["type"], "goals");
    assert_eq!(json["day"], "2025-12-06");
}

#[test]
fn referee_failure_degrades_to_no_data() {
    let inner = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), Some("Gil Manzano")))
        .with_team(3, low_scoring_team())
        .with_team(4, low_scoring_team());
    let mut source = FlakySource::new(inner);
    source.fail_referee = true;

    let digest = compose_daily_digest(matchday(), &source).unwrap();
    assert!(digest.text.contains("👨‍⚖️ Árbitro: Gil Manzano"));
    assert!(digest.text.contains("No hay suficientes datos recientes"));
    assert_eq!(digest.picks[0].star.confidence, 0.70);
}

#[test]
fn player_failure_on_one_side_drops_the_section() {
    let mut home = low_scoring_team();
    home.roster = vec![PlayerSeasonLine {
        name: "Gudelj".to_string(),
        matches: 12,
        yellow: 6,
        red: 0,
    }];
    let inner = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), None))
        .with_team(3, home)
        .with_team(4, low_scoring_team());

    let healthy = compose_daily_digest(matchday(), &inner).unwrap();
    assert!(healthy.text.contains("🧨 Jugadores propensos a tarjeta:"));
    assert!(
        healthy
            .text
            .contains("Sevilla: Gudelj (6 tarjetas en 12 partidos, 0.50/partido)")
    );

    let mut source = FlakySource::new(inner);
    source.fail_players_for = Some(4);
    let degraded = compose_daily_digest(matchday(), &source).unwrap();
    assert!(!degraded.text.contains("Jugadores propensos"));
    assert_eq!(degraded.picks, healthy.picks);
}

#[test]
fn team_stat_failure_aborts_the_digest() {
    let inner = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (4, "Getafe"), None))
        .with_team(3, low_scoring_team())
        .with_team(4, low_scoring_team());
    let mut source = FlakySource::new(inner);
    source.fail_team_cards = true;

    let err = compose_daily_digest(matchday(), &source).unwrap_err();
    let doc = error_document(matchday(), &err);
    assert!(doc.starts_with("⚠️ Error generando pronósticos (06/12/2025): "));
    assert!(doc.contains("statistics endpoint unavailable"));
}

#[test]
fn missing_team_ids_yield_no_bet_blocks() {
    let mut unknown = fixture((5, "Alavés"), (6, "Elche"), None);
    unknown.home_team_id = None;
    unknown.kickoff = None;
    let stats = InMemoryStats::default().with_fixture(unknown);

    let digest = compose_daily_digest(matchday(), &stats).unwrap();
    assert!(
        digest
            .text
            .contains("🔹 Goles: Sin datos suficientes de los equipos en API-Football")
    );
    assert!(
        digest
            .text
            .contains("🔹 Tarjetas: Sin datos suficientes de los equipos en API-Football")
    );
    assert!(digest.text.contains("(Hora por confirmar)"));

    let star = &digest.picks[0].star;
    assert_eq!(star.domain, BetDomain::Goals);
    assert_eq!(star.pick, NO_GOALS_PICK);
    assert_eq!(star.confidence, 0.0);
}

#[test]
fn teams_without_season_matches_get_no_card_line() {
    let mut fresh = low_scoring_team();
    fresh.cards = CardTotals::default();
    let stats = InMemoryStats::default()
        .with_fixture(fixture((3, "Sevilla"), (7, "Levante"), None))
        .with_team(3, low_scoring_team())
        .with_team(7, fresh);

    let digest = compose_daily_digest(matchday(), &stats).unwrap();
    assert!(digest.text.contains("🔹 Tarjetas: Sin datos suficientes de la temporada"));
    assert_eq!(digest.picks[0].star.domain, BetDomain::Goals);
    assert_eq!(digest.picks[0].star.confidence, 0.65);
}
