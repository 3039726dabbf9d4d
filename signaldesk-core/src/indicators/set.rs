//! The fixed indicator bundle computed for every symbol.

use std::fmt;

use super::indicator::{Indicator, IndicatorValues};
use super::{Atr, Ema, Macd, MacdLine, RelativeVolume, Rsi, Sma};
use crate::config::WindowConfig;
use crate::domain::Bar;

/// Indicators derived from one `WindowConfig`, computed together.
///
/// Windows must already be validated; constructing from zero or inverted
/// windows panics in the individual indicator constructors.
pub struct IndicatorSet {
    indicators: Vec<Box<dyn Indicator>>,
    required_bars: usize,
}

impl IndicatorSet {
    pub fn from_windows(windows: &WindowConfig) -> Self {
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(windows.short_ma)),
            Box::new(Sma::new(windows.long_ma)),
            Box::new(Ema::new(windows.trend_ema)),
            Box::new(Rsi::new(windows.rsi)),
            Box::new(Macd::new(
                windows.macd_fast,
                windows.macd_slow,
                windows.macd_signal,
                MacdLine::Line,
            )),
            Box::new(Macd::new(
                windows.macd_fast,
                windows.macd_slow,
                windows.macd_signal,
                MacdLine::Signal,
            )),
            Box::new(Macd::new(
                windows.macd_fast,
                windows.macd_slow,
                windows.macd_signal,
                MacdLine::Histogram,
            )),
            Box::new(Atr::new(windows.atr)),
            Box::new(RelativeVolume::new(windows.rvol)),
        ];
        Self {
            indicators,
            required_bars: windows.required_bars(),
        }
    }

    /// Compute every indicator over the full bar history.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        for indicator in &self.indicators {
            let series = indicator.compute(bars);
            debug_assert_eq!(
                series.len(),
                bars.len(),
                "indicator '{}' produced {} values for {} bars",
                indicator.name(),
                series.len(),
                bars.len()
            );
            values.insert(indicator.name(), series);
        }
        values
    }

    pub fn required_bars(&self) -> usize {
        self.required_bars
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|i| i.name())
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

impl fmt::Debug for IndicatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorSet")
            .field("indicators", &self.names().collect::<Vec<_>>())
            .field("required_bars", &self.required_bars)
            .finish()
    }
}
