//! Watch-list scanner.
//!
//! For each entry: fetch through the session cache under a deadline, then
//! evaluate. Any per-symbol failure becomes an `Exclusion`; the scan itself
//! only fails for an empty watch-list.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use signaldesk_core::data::{BarCache, CachedProvider, DataError, DataProvider};
use signaldesk_core::domain::WatchlistEntry;
use signaldesk_core::{ConfigError, EngineConfig, EngineError, SignalEngine, SignalResult};

use crate::deadline::DeadlineProvider;
use crate::options::ScanOptions;
use crate::report::{BenchmarkSummary, Exclusion, ExclusionReason, ScanReport};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("watch-list is empty")]
    EmptyWatchlist,

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

enum Outcome {
    Signal(Box<SignalResult>),
    Excluded(Exclusion),
    Skipped(String),
}

/// A configured scan session: engine, provider stack and cache.
pub struct Scanner {
    engine: SignalEngine,
    provider: DeadlineProvider,
    cache: Arc<BarCache>,
    options: ScanOptions,
    fingerprint: String,
}

impl Scanner {
    /// Validate `config` and wrap `provider` in a fresh session cache and a
    /// per-fetch deadline.
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn DataProvider>,
        options: ScanOptions,
    ) -> Result<Self, ScanError> {
        let fingerprint = config.fingerprint();
        let engine = SignalEngine::new(config)?;
        if options.lookback < engine.required_bars() {
            tracing::warn!(
                lookback = options.lookback,
                required = engine.required_bars(),
                "lookback is shorter than the engine needs; every symbol will be excluded"
            );
        }

        let cache = Arc::new(BarCache::new(options.cache_ttl()));
        let cached: Arc<dyn DataProvider> =
            Arc::new(CachedProvider::new(provider, Arc::clone(&cache)));
        let provider = DeadlineProvider::new(cached, options.timeout());

        Ok(Self {
            engine,
            provider,
            cache,
            options,
            fingerprint,
        })
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// The session cache, for explicit invalidation between scans.
    pub fn cache(&self) -> &Arc<BarCache> {
        &self.cache
    }

    /// Scan `entries`, preserving their order in the report.
    ///
    /// `cancel` stops further fetches; entries not yet started are reported
    /// as skipped.
    pub fn scan(
        &self,
        entries: &[WatchlistEntry],
        cancel: Option<&AtomicBool>,
    ) -> Result<ScanReport, ScanError> {
        if entries.is_empty() {
            return Err(ScanError::EmptyWatchlist);
        }

        let start = Instant::now();
        tracing::info!(
            symbols = entries.len(),
            provider = self.provider.name(),
            parallel = self.options.parallel,
            "scan started"
        );

        let benchmark = self.options.benchmark.as_deref().map(|code| self.fetch_benchmark(code));
        let benchmark_return = benchmark.as_ref().and_then(|b| b.period_return);

        let outcomes: Vec<Outcome> = if self.options.parallel {
            entries
                .par_iter()
                .map(|entry| self.scan_entry(entry, benchmark_return, cancel))
                .collect()
        } else {
            entries
                .iter()
                .map(|entry| self.scan_entry(entry, benchmark_return, cancel))
                .collect()
        };

        let mut results = Vec::new();
        let mut excluded = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Signal(result) => results.push(*result),
                Outcome::Excluded(exclusion) => excluded.push(exclusion),
                Outcome::Skipped(code) => skipped.push(code),
            }
        }

        let report = ScanReport {
            results,
            excluded,
            skipped,
            requested: entries.len(),
            config_fingerprint: self.fingerprint.clone(),
            benchmark,
            cache: self.cache.stats(),
            scanned_at: chrono::Utc::now(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            results = report.results.len(),
            excluded = report.excluded.len(),
            skipped = report.skipped.len(),
            elapsed_ms = report.elapsed_ms,
            status = ?report.status(),
            "scan finished"
        );
        Ok(report)
    }

    fn fetch_benchmark(&self, code: &str) -> BenchmarkSummary {
        match self.provider.fetch(code, self.options.lookback) {
            Ok(series) => {
                let period_return = self.engine.benchmark_return(&series);
                if period_return.is_none() {
                    tracing::warn!(
                        benchmark = code,
                        bars = series.len(),
                        "benchmark history too short"
                    );
                }
                BenchmarkSummary {
                    symbol: code.to_string(),
                    period_return,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    benchmark = code,
                    error = %e,
                    "benchmark unavailable; relative strength disabled"
                );
                BenchmarkSummary {
                    symbol: code.to_string(),
                    period_return: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn scan_entry(
        &self,
        entry: &WatchlistEntry,
        benchmark_return: Option<f64>,
        cancel: Option<&AtomicBool>,
    ) -> Outcome {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return Outcome::Skipped(entry.code.clone());
        }

        let exclude = |reason: ExclusionReason| {
            tracing::warn!(symbol = %entry.code, %reason, "excluded");
            Outcome::Excluded(Exclusion {
                symbol: entry.code.clone(),
                name: entry.display_name().to_string(),
                reason,
            })
        };

        let series = match self.provider.fetch(&entry.code, self.options.lookback) {
            Ok(series) => series,
            Err(DataError::Timeout { timeout_ms, .. }) => {
                return exclude(ExclusionReason::Timeout { timeout_ms })
            }
            Err(e) => {
                return exclude(ExclusionReason::Provider {
                    message: e.to_string(),
                })
            }
        };

        match self.engine.evaluate(entry, &series, benchmark_return) {
            Ok(result) => Outcome::Signal(Box::new(result)),
            Err(EngineError::InsufficientData {
                required,
                available,
                ..
            }) => exclude(ExclusionReason::InsufficientData {
                required,
                available,
            }),
        }
    }
}
