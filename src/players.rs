use std::cmp::Ordering;

use crate::stats::{PlayerCardFilter, PlayerCardStats, PlayerSeasonLine};

/// Ranks roster lines by card propensity.
///
/// A player qualifies with enough matches *or* enough cards, so a short but
/// heavily booked spell still counts. Players without matches or without
/// cards never qualify.
pub fn rank_card_prone_players(
    roster: &[PlayerSeasonLine],
    filter: PlayerCardFilter,
) -> Vec<PlayerCardStats> {
    let mut ranked: Vec<PlayerCardStats> = roster
        .iter()
        .filter_map(|line| {
            let total_cards = line.yellow.saturating_add(line.red);
            if line.matches == 0 || total_cards == 0 {
                return None;
            }
            if line.matches < filter.min_matches && total_cards < filter.min_cards {
                return None;
            }
            Some(PlayerCardStats {
                name: line.name.clone(),
                matches: line.matches,
                yellow: line.yellow,
                red: line.red,
                total_cards,
                cards_per_match: total_cards as f64 / line.matches as f64,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.cards_per_match
            .partial_cmp(&a.cards_per_match)
            .unwrap_or(Ordering::Equal)
            .then(b.total_cards.cmp(&a.total_cards))
    });
    ranked.truncate(filter.top_n);
    ranked
}

pub fn describe_players(players: &[PlayerCardStats]) -> String {
    players
        .iter()
        .map(|p| {
            format!(
                "{} ({} tarjetas en {} partidos, {:.2}/partido)",
                p.name, p.total_cards, p.matches, p.cards_per_match
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
