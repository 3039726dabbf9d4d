//! Stop-loss price derivation.
//!
//! `Atr`: close - k * ATR. No floor is applied; degenerate inputs can give a
//! negative stop and that is reported as-is.
//!
//! `Support`: min(lowest low of the last `lookback` bars, long SMA) * (1 - buffer).

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopMethod {
    Atr { multiplier: f64 },
    Support { lookback: usize, buffer: f64 },
}

impl Default for StopMethod {
    fn default() -> Self {
        StopMethod::Atr { multiplier: 2.0 }
    }
}

/// Inputs available to a stop computation at the latest bar.
#[derive(Debug, Clone, Copy)]
pub struct StopInputs<'a> {
    pub bars: &'a [Bar],
    pub atr: Option<f64>,
    pub long_ma: Option<f64>,
}

impl StopMethod {
    /// Stop price for the latest bar, `None` when an input is missing.
    pub fn compute(&self, inputs: &StopInputs<'_>) -> Option<f64> {
        let last = inputs.bars.last()?;
        match *self {
            StopMethod::Atr { multiplier } => Some(atr_stop(last.close, inputs.atr?, multiplier)),
            StopMethod::Support { lookback, buffer } => {
                support_stop(inputs.bars, inputs.long_ma?, lookback, buffer)
            }
        }
    }
}

pub fn atr_stop(close: f64, atr: f64, multiplier: f64) -> f64 {
    close - multiplier * atr
}

/// Support stop over the last `lookback` bars. `None` for an empty window.
pub fn support_stop(bars: &[Bar], long_ma: f64, lookback: usize, buffer: f64) -> Option<f64> {
    let start = bars.len().saturating_sub(lookback);
    let lowest = bars[start..]
        .iter()
        .map(|b| b.low)
        .min_by(|a, b| a.total_cmp(b))?;
    Some(lowest.min(long_ma) * (1.0 - buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn atr_stop_exact() {
        assert_eq!(atr_stop(100.0, 5.0, 2.0), 90.0);
        assert_approx(atr_stop(100.0, 5.0, 1.5), 92.5, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_stop_is_not_floored() {
        assert!(atr_stop(1.0, 5.0, 2.0) < 0.0);
    }

    #[test]
    fn support_uses_lower_of_low_and_ma() {
        let bars = make_ohlc_bars(&[
            (10.0, 10.5, 8.0, 10.0), // outside the 3-bar window
            (10.0, 10.5, 9.5, 10.0),
            (10.0, 10.5, 9.2, 10.0),
            (10.0, 10.5, 9.8, 10.0),
        ]);
        let stop = support_stop(&bars, 9.6, 3, 0.02).unwrap();
        assert_approx(stop, 9.2 * 0.98, DEFAULT_EPSILON);

        let stop = support_stop(&bars, 9.0, 3, 0.02).unwrap();
        assert_approx(stop, 9.0 * 0.98, DEFAULT_EPSILON);
    }

    #[test]
    fn compute_dispatches_and_requires_inputs() {
        let bars = make_ohlc_bars(&[(100.0, 101.0, 99.0, 100.0)]);
        let method = StopMethod::Atr { multiplier: 2.0 };
        let with_atr = StopInputs {
            bars: &bars,
            atr: Some(5.0),
            long_ma: None,
        };
        assert_eq!(method.compute(&with_atr), Some(90.0));

        let support = StopMethod::Support {
            lookback: 5,
            buffer: 0.0,
        };
        assert_eq!(support.compute(&with_atr), None);

        let empty = StopInputs {
            bars: &[],
            atr: Some(5.0),
            long_ma: Some(1.0),
        };
        assert_eq!(method.compute(&empty), None);
    }

    #[test]
    fn serde_tagged() {
        let json = serde_json::to_string(&StopMethod::Atr { multiplier: 1.5 }).unwrap();
        assert_eq!(json, r#"{"type":"atr","multiplier":1.5}"#);
    }
}
