//! Synthetic bar provider for demos and tests.
//!
//! Produces a weekday random walk from a starting price of 100.0, seeded by
//! the BLAKE3 hash of the symbol. The same symbol and end date always give the
//! same bars. These bars are clearly fake and must never feed a real decision.

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    end: NaiveDate,
    /// Extra bars generated ahead of the requested window so the walk does
    /// not always start at exactly 100.0 on the first returned bar.
    burn_in: usize,
}

impl SyntheticProvider {
    /// Walk ending on `end` (or the last weekday before it).
    pub fn new(end: NaiveDate) -> Self {
        Self { end, burn_in: 20 }
    }

    /// Walk ending today.
    pub fn ending_today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The `count` weekdays ending at or before `end`, oldest first.
fn trading_days(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = end;
    while days.len() < count {
        if is_weekday(current) {
            days.push(current);
        }
        current -= Duration::days(1);
    }
    days.reverse();
    days
}

/// Deterministic random-walk bars for `symbol` on the given dates.
pub fn synthetic_bars(symbol: &str, dates: &[NaiveDate]) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut price = 100.0_f64;
    dates
        .iter()
        .map(|&date| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            price = close;
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError> {
        let dates = trading_days(self.end, lookback + self.burn_in);
        let bars = synthetic_bars(symbol, &dates);
        let series = BarSeries::new(symbol, bars).map_err(|e| DataError::invalid_bars(symbol, e))?;
        Ok(series.tail(lookback))
    }
}
