//! Scan session options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a scan fetches data, separate from the engine's parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Bars requested per symbol.
    pub lookback: usize,
    /// Deadline for one symbol's fetch.
    pub timeout_secs: u64,
    /// Time-to-live of the session bar cache.
    pub cache_ttl_secs: u64,
    /// Evaluate symbols on the rayon pool.
    pub parallel: bool,
    /// Symbol whose return is the relative-strength baseline.
    pub benchmark: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            lookback: 120,
            timeout_secs: 10,
            cache_ttl_secs: 300,
            parallel: true,
            benchmark: None,
        }
    }
}

impl ScanOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn with_benchmark(mut self, code: impl Into<String>) -> Self {
        self.benchmark = Some(code.into());
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ScanOptions::default();
        assert_eq!(opts.lookback, 120);
        assert_eq!(opts.timeout(), Duration::from_secs(10));
        assert_eq!(opts.cache_ttl(), Duration::from_secs(300));
        assert!(opts.parallel);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let opts: ScanOptions = serde_json::from_str(r#"{"benchmark":"000300"}"#).unwrap();
        assert_eq!(opts.benchmark.as_deref(), Some("000300"));
        assert_eq!(opts.lookback, 120);
    }
}
