//! Relative Volume (RVOL).
//!
//! RVOL[t] = volume[t] / mean(volume[t-window .. t-1]).
//! The trailing mean excludes the current bar. Lookback: window.
//! A zero trailing mean leaves the value undefined (NaN).

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RelativeVolume {
    window: usize,
    name: String,
}

impl RelativeVolume {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RVOL window must be >= 1");
        Self {
            window,
            name: rvol_key(window),
        }
    }
}

/// Snapshot key for an RVOL over `window` bars.
pub fn rvol_key(window: usize) -> String {
    format!("RVOL_{window}")
}

impl Indicator for RelativeVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.window {
            return result;
        }

        let mut trailing: f64 = bars[..self.window].iter().map(|b| b.volume as f64).sum();
        for i in self.window..n {
            let avg = trailing / self.window as f64;
            if avg > 0.0 {
                result[i] = bars[i].volume as f64 / avg;
            }
            trailing += bars[i].volume as f64 - bars[i - self.window].volume as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn with_volumes(volumes: &[u64]) -> Vec<Bar> {
        let closes = vec![10.0; volumes.len()];
        let mut bars = make_bars(&closes);
        for (bar, &v) in bars.iter_mut().zip(volumes) {
            bar.volume = v;
        }
        bars
    }

    #[test]
    fn constant_volume_is_one() {
        let bars = with_volumes(&[500; 25]);
        let result = RelativeVolume::new(20).compute(&bars);
        assert!(result[19].is_nan());
        for v in &result[20..] {
            assert_approx(*v, 1.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn excludes_current_bar_from_average() {
        let bars = with_volumes(&[100, 100, 100, 400]);
        let result = RelativeVolume::new(3).compute(&bars);
        assert_approx(result[3], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn window_rolls_forward() {
        let bars = with_volumes(&[100, 200, 300, 400, 300]);
        let result = RelativeVolume::new(2).compute(&bars);
        assert_approx(result[2], 2.0, DEFAULT_EPSILON); // 300 / 150
        assert_approx(result[3], 1.6, DEFAULT_EPSILON); // 400 / 250
        assert_approx(result[4], 300.0 / 350.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_trailing_volume_is_undefined() {
        let bars = with_volumes(&[0, 0, 0, 1000]);
        let result = RelativeVolume::new(3).compute(&bars);
        assert!(result[3].is_nan());
    }
}
