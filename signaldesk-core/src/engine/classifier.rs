//! Three-band recommendation from score and crossover event.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::events::CrossEvent;
use crate::config::ThresholdConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Neutral,
    Reduce,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy/Hold",
            Recommendation::Neutral => "Neutral/Watch",
            Recommendation::Reduce => "Reduce/Exit",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a score and optional crossover to a band. First match wins:
/// golden cross or score at/above `high`, then death cross or score at/below
/// `low`, otherwise neutral.
pub fn classify(
    score: i32,
    event: Option<CrossEvent>,
    thresholds: &ThresholdConfig,
) -> Recommendation {
    if event == Some(CrossEvent::Golden) || score >= thresholds.high {
        Recommendation::StrongBuy
    } else if event == Some(CrossEvent::Death) || score <= thresholds.low {
        Recommendation::Reduce
    } else {
        Recommendation::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: ThresholdConfig = ThresholdConfig { high: 70, low: 40 };

    #[test]
    fn bands_by_score() {
        assert_eq!(classify(70, None, &T), Recommendation::StrongBuy);
        assert_eq!(classify(69, None, &T), Recommendation::Neutral);
        assert_eq!(classify(41, None, &T), Recommendation::Neutral);
        assert_eq!(classify(40, None, &T), Recommendation::Reduce);
        assert_eq!(classify(-20, None, &T), Recommendation::Reduce);
    }

    #[test]
    fn golden_cross_overrides_low_score() {
        assert_eq!(
            classify(10, Some(CrossEvent::Golden), &T),
            Recommendation::StrongBuy
        );
    }

    #[test]
    fn death_cross_overrides_neutral_score() {
        assert_eq!(classify(55, Some(CrossEvent::Death), &T), Recommendation::Reduce);
    }

    #[test]
    fn high_score_beats_death_cross() {
        // Rule 1 is checked first.
        assert_eq!(
            classify(90, Some(CrossEvent::Death), &T),
            Recommendation::StrongBuy
        );
    }

    #[test]
    fn thresholds_are_parameters() {
        let loose = ThresholdConfig { high: 60, low: 50 };
        assert_eq!(classify(60, None, &loose), Recommendation::StrongBuy);
        assert_eq!(classify(50, None, &loose), Recommendation::Reduce);
    }

    #[test]
    fn labels() {
        assert_eq!(Recommendation::Neutral.to_string(), "Neutral/Watch");
    }
}
