//! Signal engine: one bar series in, one signal result out.
//!
//! The pipeline for each symbol:
//!
//! 1. Indicators: SMA pair, trend EMA, RSI, MACD, ATR, RVOL over the full history
//! 2. Events: golden/death cross between the last two bars
//! 3. Scoring: base score plus the factor table
//! 4. Classification: three bands with crossover overrides
//! 5. Stop-loss: ATR- or support-based exit price

pub mod classifier;
pub mod events;
pub mod scoring;
pub mod stop_loss;

pub use classifier::{classify, Recommendation};
pub use events::{detect_cross, CrossEvent};
pub use scoring::{score, Contribution, Factor, FactorRule, ScoreCard, ScoringContext};
pub use stop_loss::{atr_stop, support_stop, StopInputs, StopMethod};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig, IndicatorKeys};
use crate::domain::{BarSeries, WatchlistEntry};
use crate::indicators::{IndicatorSet, IndicatorSnapshot, IndicatorValues};

/// Per-symbol evaluation failure. The symbol is skipped, the scan continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{symbol}: insufficient data ({available} bars, need {required})")]
    InsufficientData {
        symbol: String,
        required: usize,
        available: usize,
    },
}

/// Everything the engine derived for one symbol at its latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub as_of: NaiveDate,
    pub last_price: f64,
    pub change_pct: Option<f64>,
    /// Return over the relative-return window (5 bars by default).
    pub period_return: Option<f64>,
    /// `period_return` minus the benchmark's return over the same window.
    pub relative_return: Option<f64>,
    pub indicators: IndicatorSnapshot,
    pub event: Option<CrossEvent>,
    pub rationale: Vec<String>,
    pub score: i32,
    pub breakdown: Vec<Contribution>,
    pub recommendation: Recommendation,
    /// Stop derived from the latest bar, in force for the next session.
    pub stop_loss: Option<f64>,
    /// Stop derived from the previous bar, in force during the latest one.
    pub active_stop: Option<f64>,
    /// Latest close below `active_stop`. Informational only.
    pub stop_breached: bool,
}

impl SignalResult {
    /// Event tags followed by rationale tags.
    pub fn tags(&self) -> Vec<&str> {
        self.event
            .iter()
            .map(|e| e.tag())
            .chain(self.rationale.iter().map(String::as_str))
            .collect()
    }
}

/// Configured evaluation pipeline. Immutable and shareable across threads.
#[derive(Debug)]
pub struct SignalEngine {
    config: EngineConfig,
    indicators: IndicatorSet,
    keys: IndicatorKeys,
}

impl SignalEngine {
    /// Validate `config` and build the indicator set.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let indicators = IndicatorSet::from_windows(&config.windows);
        let keys = config.windows.keys();
        Ok(Self {
            config,
            indicators,
            keys,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn keys(&self) -> &IndicatorKeys {
        &self.keys
    }

    pub fn required_bars(&self) -> usize {
        self.indicators.required_bars()
    }

    /// Compute every indicator series, failing when the required windows
    /// cannot be satisfied.
    pub fn compute(&self, series: &BarSeries) -> Result<IndicatorValues, EngineError> {
        let required = self.required_bars();
        if series.len() < required {
            return Err(EngineError::InsufficientData {
                symbol: series.symbol().to_string(),
                required,
                available: series.len(),
            });
        }
        Ok(self.indicators.compute(series.bars()))
    }

    /// Return used for relative-strength comparison.
    pub fn benchmark_return(&self, series: &BarSeries) -> Option<f64> {
        series.return_over(self.config.windows.relative_return)
    }

    /// Full evaluation of one symbol.
    pub fn evaluate(
        &self,
        entry: &WatchlistEntry,
        series: &BarSeries,
        benchmark_return: Option<f64>,
    ) -> Result<SignalResult, EngineError> {
        let values = self.compute(series)?;
        let bars = series.bars();
        let insufficient = || EngineError::InsufficientData {
            symbol: series.symbol().to_string(),
            required: self.required_bars(),
            available: bars.len(),
        };
        let last_index = bars.len().checked_sub(1).ok_or_else(insufficient)?;
        let prev_index = last_index.checked_sub(1).ok_or_else(insufficient)?;
        let last = &bars[last_index];

        let latest = values.snapshot(last_index);
        let ma = |key: &str, i: usize| values.get(key, i).unwrap_or(f64::NAN);
        let event = detect_cross(
            ma(&self.keys.short_ma, prev_index),
            ma(&self.keys.long_ma, prev_index),
            ma(&self.keys.short_ma, last_index),
            ma(&self.keys.long_ma, last_index),
        );

        let period_return = self.benchmark_return(series);
        let ctx = ScoringContext {
            keys: &self.keys,
            latest: &latest,
            bar: last,
            event,
            symbol_return: period_return,
            benchmark_return,
        };
        let card = score(self.config.base_score, &self.config.factors, &ctx);
        let recommendation = classify(card.total, event, &self.config.thresholds);

        let stop_loss = self.config.stop.compute(&StopInputs {
            bars,
            atr: latest.get(&self.keys.atr),
            long_ma: latest.get(&self.keys.long_ma),
        });
        let active_stop = self.config.stop.compute(&StopInputs {
            bars: &bars[..=prev_index],
            atr: values.get(&self.keys.atr, prev_index),
            long_ma: values.get(&self.keys.long_ma, prev_index),
        });
        let stop_breached = active_stop.is_some_and(|stop| last.close < stop);

        tracing::debug!(
            symbol = series.symbol(),
            score = card.total,
            recommendation = recommendation.label(),
            event = event.map(|e| e.tag()),
            "evaluated"
        );

        let relative_return = period_return
            .zip(benchmark_return)
            .map(|(own, bench)| own - bench);

        Ok(SignalResult {
            symbol: series.symbol().to_string(),
            name: entry.display_name().to_string(),
            sector: entry.sector.clone(),
            as_of: last.date,
            last_price: last.close,
            change_pct: series.daily_change_pct(),
            period_return,
            relative_return,
            indicators: latest,
            event,
            rationale: card.tags().map(str::to_string).collect(),
            score: card.total,
            breakdown: card.contributions,
            recommendation,
            stop_loss,
            active_stop,
            stop_breached,
        })
    }
}
