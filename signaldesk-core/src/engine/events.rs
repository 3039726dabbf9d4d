//! Moving-average crossover events: golden cross and death cross.
//!
//! A golden cross fires when the short MA moves from at-or-below the long MA
//! on the previous bar to strictly above it on the latest bar. A death cross
//! is the mirror image. Equality on the latest bar never fires.

use serde::{Deserialize, Serialize};

/// Crossover event on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossEvent {
    Golden,
    Death,
}

impl CrossEvent {
    /// Short rationale tag.
    pub fn tag(&self) -> &'static str {
        match self {
            CrossEvent::Golden => "golden cross",
            CrossEvent::Death => "death cross",
        }
    }
}

/// Detect a crossover between the previous and current MA pair.
///
/// Any non-finite input yields `None`.
pub fn detect_cross(
    prev_short: f64,
    prev_long: f64,
    curr_short: f64,
    curr_long: f64,
) -> Option<CrossEvent> {
    if ![prev_short, prev_long, curr_short, curr_long]
        .iter()
        .all(|v| v.is_finite())
    {
        return None;
    }

    if prev_short <= prev_long && curr_short > curr_long {
        Some(CrossEvent::Golden)
    } else if prev_short >= prev_long && curr_short < curr_long {
        Some(CrossEvent::Death)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_cross_from_below() {
        assert_eq!(detect_cross(9.8, 10.0, 10.2, 10.0), Some(CrossEvent::Golden));
    }

    #[test]
    fn golden_cross_from_touch() {
        assert_eq!(detect_cross(10.0, 10.0, 10.1, 10.0), Some(CrossEvent::Golden));
    }

    #[test]
    fn death_cross_from_above() {
        assert_eq!(detect_cross(10.2, 10.0, 9.8, 10.0), Some(CrossEvent::Death));
    }

    #[test]
    fn equality_on_latest_bar_never_fires() {
        assert_eq!(detect_cross(9.8, 10.0, 10.0, 10.0), None);
        assert_eq!(detect_cross(10.2, 10.0, 10.0, 10.0), None);
    }

    #[test]
    fn no_event_without_a_transition() {
        assert_eq!(detect_cross(10.5, 10.0, 10.6, 10.0), None);
        assert_eq!(detect_cross(9.5, 10.0, 9.4, 10.0), None);
    }

    #[test]
    fn undefined_inputs_yield_no_event() {
        assert_eq!(detect_cross(f64::NAN, 10.0, 10.2, 10.0), None);
        assert_eq!(detect_cross(9.8, 10.0, 10.2, f64::INFINITY), None);
    }

    #[test]
    fn tags() {
        assert_eq!(CrossEvent::Golden.tag(), "golden cross");
        assert_eq!(CrossEvent::Death.tag(), "death cross");
    }
}
