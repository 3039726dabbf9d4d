//! Bar and BarSeries — the fundamental market data units.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar.
///
/// A bar carries no symbol; it always lives inside a [`BarSeries`] that does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// OHLC sanity: positive prices and `low <= open, close <= high`.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.open > 0.0
            && self.close > 0.0
            && self.low > 0.0
            && self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.high >= self.open
            && self.high >= self.close
    }

    /// Where the close sits inside the day's range, 0.0 (low) to 1.0 (high).
    ///
    /// A flat day (`high == low`) has no range to sit in and reports 0.0.
    pub fn close_position(&self) -> f64 {
        let range = self.high - self.low;
        if range <= 0.0 {
            return 0.0;
        }
        (self.close - self.low) / range
    }
}

/// Structural problems found while building a [`BarSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {date}: prices must be finite and positive")]
    NonPositivePrice { date: NaiveDate },

    #[error("bar {date}: expected low <= open, close <= high")]
    InvertedRange { date: NaiveDate },

    #[error("bar {date} appears twice")]
    DuplicateDate { date: NaiveDate },

    #[error("bar {date} is out of order (previous bar is {previous})")]
    OutOfOrder { previous: NaiveDate, date: NaiveDate },
}

/// Chronologically ordered daily bars for one symbol.
///
/// Dates are strictly increasing. The series is immutable once built;
/// derived data (indicators) lives in separate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

/// Unvalidated wire form; deserialization goes through `BarSeries::new`.
#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl TryFrom<RawSeries> for BarSeries {
    type Error = BarError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        BarSeries::new(raw.symbol, raw.bars)
    }
}

impl BarSeries {
    /// Validate and wrap a list of bars.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        for (i, bar) in bars.iter().enumerate() {
            if bar.is_void() || bar.open <= 0.0 || bar.close <= 0.0 || bar.low <= 0.0 {
                return Err(BarError::NonPositivePrice { date: bar.date });
            }
            if !bar.is_sane() {
                return Err(BarError::InvertedRange { date: bar.date });
            }
            if i > 0 {
                let previous = bars[i - 1].date;
                if bar.date == previous {
                    return Err(BarError::DuplicateDate { date: bar.date });
                }
                if bar.date < previous {
                    return Err(BarError::OutOfOrder {
                        previous,
                        date: bar.date,
                    });
                }
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Keep only the most recent `n` bars.
    pub fn tail(&self, n: usize) -> BarSeries {
        let start = self.bars.len().saturating_sub(n);
        BarSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[start..].to_vec(),
        }
    }

    /// Simple return over the last `n` bars: `close[t] / close[t-n] - 1`.
    ///
    /// `None` when the series is shorter than `n + 1` bars.
    pub fn return_over(&self, n: usize) -> Option<f64> {
        let len = self.bars.len();
        if n == 0 || len < n + 1 {
            return None;
        }
        let latest = self.bars[len - 1].close;
        let base = self.bars[len - 1 - n].close;
        Some(latest / base - 1.0)
    }

    /// Percent change of the latest close against the previous close.
    pub fn daily_change_pct(&self) -> Option<f64> {
        self.return_over(1).map(|r| r * 100.0)
    }
}
