/// Output of one prediction domain for a fixture.
///
/// `confidence == 0.0` together with `candidate == None` is the explicit
/// "no bet" signal shown to readers.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBlock {
    pub text: String,
    pub candidate: Option<String>,
    pub confidence: f64,
}

impl PredictionBlock {
    pub fn new(lines: Vec<String>, candidate: Option<String>, confidence: f64) -> Self {
        Self {
            text: lines.join("\n"),
            candidate,
            confidence,
        }
    }

    pub fn no_bet(headline: &str, reason: &str) -> Self {
        Self {
            text: format!("{headline}\n   💬 {reason}"),
            candidate: None,
            confidence: 0.0,
        }
    }
}

pub(crate) fn pct(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}
