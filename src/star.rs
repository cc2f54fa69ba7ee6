use std::fmt;

use serde::{Deserialize, Serialize};

use crate::prediction::PredictionBlock;

pub const NO_GOALS_PICK: &str = "Sin apuesta clara en goles";

const GOALS_OVERRIDE_CONFIDENCE: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetDomain {
    Goals,
    Cards,
}

impl BetDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goals => "goals",
            Self::Cards => "cards",
        }
    }

    /// Label used inside the Spanish report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Goals => "goles",
            Self::Cards => "tarjetas",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "goals" | "goles" => Some(Self::Goals),
            "cards" | "tarjetas" => Some(Self::Cards),
            _ => None,
        }
    }
}

impl fmt::Display for BetDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarBet {
    #[serde(rename = "type")]
    pub domain: BetDomain,
    pub pick: String,
    pub confidence: f64,
}

/// Picks the fixture's star bet.
///
/// Goals is the default domain. A very strong goals signal wins outright;
/// otherwise cards must have a candidate and strictly beat goals.
pub fn select_star_bet(goals: &PredictionBlock, cards: &PredictionBlock) -> StarBet {
    if goals.confidence < GOALS_OVERRIDE_CONFIDENCE
        && let Some(pick) = cards.candidate.as_ref()
        && cards.confidence > goals.confidence
    {
        return StarBet {
            domain: BetDomain::Cards,
            pick: pick.clone(),
            confidence: cards.confidence,
        };
    }

    StarBet {
        domain: BetDomain::Goals,
        pick: goals
            .candidate
            .clone()
            .unwrap_or_else(|| NO_GOALS_PICK.to_string()),
        confidence: goals.confidence,
    }
}
