use std::fs;
use std::path::PathBuf;

use laliga_tips::api_parse::{
    OverRateSource, parse_fixture_card_total_json, parse_fixture_ids_json, parse_fixtures_json,
    parse_paging, parse_player_lines_json, parse_recent_scores_json, parse_team_card_stats_json,
    parse_team_goal_stats_json,
};
use laliga_tips::players::rank_card_prone_players;
use laliga_tips::stats::{PlayerCardFilter, TeamRecentGoalStats};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_day_fixtures() {
    let raw = read_fixture("fixtures_day.json");
    let fixtures = parse_fixtures_json(&raw).expect("fixture should parse");
    assert_eq!(fixtures.len(), 2);

    assert_eq!(fixtures[0].fixture_id, Some(1390870));
    assert_eq!(fixtures[0].home_team_id, Some(541));
    assert_eq!(fixtures[0].away_team, "Villarreal");
    assert_eq!(fixtures[0].referee_name(), Some("J. Munuera Montero"));
    assert_eq!(fixtures[0].kickoff_display(), "18:30");

    assert_eq!(fixtures[1].referee_name(), None);
    assert_eq!(fixtures[1].kickoff_display(), "21:00");
}

#[test]
fn parses_team_goal_stats_from_under_over_table() {
    let raw = read_fixture("team_statistics.json");
    let stats =
        parse_team_goal_stats_json(&raw, OverRateSource::Auto).expect("fixture should parse");
    assert_eq!(stats.matches, 14);
    assert!((stats.goals_for_avg - 2.1).abs() < 1e-9);
    assert!((stats.goals_against_avg - 1.0).abs() < 1e-9);
    assert!((stats.over_0_5_rate - 13.0 / 14.0).abs() < 1e-9);
    assert!((stats.over_1_5_rate - 10.0 / 14.0).abs() < 1e-9);
}

#[test]
fn legacy_over_source_falls_back_to_zero_rates() {
    let raw = read_fixture("team_statistics.json");
    let stats =
        parse_team_goal_stats_json(&raw, OverRateSource::Legacy).expect("fixture should parse");
    assert_eq!(stats.matches, 14);
    assert_eq!(stats.over_0_5_rate, 0.0);
    assert_eq!(stats.over_1_5_rate, 0.0);
}

#[test]
fn sums_card_minute_buckets() {
    let raw = read_fixture("team_statistics.json");
    let cards = parse_team_card_stats_json(&raw).expect("fixture should parse");
    assert_eq!(cards.matches, 14);
    assert_eq!(cards.yellow_total, 40);
    assert_eq!(cards.red_total, 1);
    assert!((cards.weighted_avg - 3.0).abs() < 1e-9);
}

#[test]
fn recent_scores_follow_team_perspective() {
    let raw = read_fixture("recent_fixtures.json");
    let scores = parse_recent_scores_json(&raw, 541).expect("fixture should parse");
    assert_eq!(scores, vec![(3, 1), (0, 0), (1, 2)]);

    let form = TeamRecentGoalStats::from_scores(&scores, 10);
    assert_eq!(form.matches, 3);
    assert!((form.over_0_5_rate - 2.0 / 3.0).abs() < 1e-9);
    assert!((form.over_1_5_rate - 2.0 / 3.0).abs() < 1e-9);

    assert_eq!(parse_fixture_ids_json(&raw).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn fixture_card_total_weights_reds() {
    let raw = read_fixture("fixture_statistics.json");
    assert_eq!(parse_fixture_card_total_json(&raw).unwrap(), Some(7));
    assert_eq!(
        parse_fixture_card_total_json(r#"{"errors": [], "response": []}"#).unwrap(),
        None
    );
}

#[test]
fn player_lines_feed_the_propensity_ranking() {
    let raw = read_fixture("players_page.json");
    assert_eq!(parse_paging(&raw).unwrap(), (1, 2));

    let lines = parse_player_lines_json(&raw).expect("fixture should parse");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2].matches, 0);

    let ranked = rank_card_prone_players(&lines, PlayerCardFilter::default());
    let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A. Tchouaméni", "F. Valverde"]);
    assert_eq!(ranked[1].total_cards, 3);
}

#[test]
fn provider_errors_are_surfaced() {
    let raw = read_fixture("api_errors.json");
    let err = parse_team_card_stats_json(&raw).unwrap_err();
    assert!(err.to_string().contains("errors"));
}
