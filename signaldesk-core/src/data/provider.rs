//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo Finance, CSV
//! files, synthetic walks) so the scanner can swap implementations and tests
//! can mock them. Caching and deadlines wrap a provider; providers do not know
//! about either.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{BarError, BarSeries};

/// Structured error types for data operations.
///
/// Every variant is a per-symbol provider failure: the symbol is excluded and
/// the scan continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("fetch for '{symbol}' timed out after {timeout_ms} ms")]
    Timeout { symbol: String, timeout_ms: u64 },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid bars for '{symbol}': {source}")]
    InvalidBars {
        symbol: String,
        #[source]
        source: BarError,
    },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    pub fn invalid_bars(symbol: &str, source: BarError) -> Self {
        DataError::InvalidBars {
            symbol: symbol.to_string(),
            source,
        }
    }
}

/// Trait for bar providers.
///
/// `lookback` is the number of most recent daily bars wanted. A provider may
/// return fewer when the history is shorter; the engine decides whether that
/// is enough.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the latest `lookback` daily bars for `symbol`, oldest first.
    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

impl<P: DataProvider + ?Sized> DataProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError> {
        (**self).fetch(symbol, lookback)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Which built-in provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Yahoo,
    Csv,
    Synthetic,
}

impl DataSource {
    pub fn name(&self) -> &'static str {
        match self {
            DataSource::Yahoo => "yahoo",
            DataSource::Csv => "csv",
            DataSource::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataSource {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo),
            "csv" => Ok(DataSource::Csv),
            "synthetic" => Ok(DataSource::Synthetic),
            other => Err(DataError::Other(format!(
                "unknown data source '{other}' (valid: yahoo, csv, synthetic)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_parses_case_insensitively() {
        assert_eq!("CSV".parse::<DataSource>().unwrap(), DataSource::Csv);
        assert_eq!(" yahoo ".parse::<DataSource>().unwrap(), DataSource::Yahoo);
        assert!("parquet".parse::<DataSource>().is_err());
    }

    #[test]
    fn invalid_bars_keeps_source() {
        use std::error::Error as _;
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = DataError::invalid_bars("X", BarError::DuplicateDate { date });
        assert!(err.source().is_some());
        assert!(err.to_string().contains("'X'"));
    }
}
