//! Scan report: ordered results plus a record of every excluded symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signaldesk_core::data::CacheStats;
use signaldesk_core::SignalResult;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Sector label used for entries without one.
pub const UNASSIGNED_SECTOR: &str = "unassigned";

/// Why a symbol produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    InsufficientData { required: usize, available: usize },
    Timeout { timeout_ms: u64 },
    Provider { message: String },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::InsufficientData {
                required,
                available,
            } => write!(f, "insufficient data ({available} of {required} bars)"),
            ExclusionReason::Timeout { timeout_ms } => write!(f, "timed out after {timeout_ms} ms"),
            ExclusionReason::Provider { message } => write!(f, "provider failure: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub symbol: String,
    pub name: String,
    pub reason: ExclusionReason,
}

/// Benchmark used for relative strength, or why it could not be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub symbol: String,
    pub period_return: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall scan outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Every requested symbol produced a result.
    Complete,
    /// Some symbols were excluded or skipped.
    Partial,
    /// The watch-list was non-empty but nothing survived.
    NoUsableResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Results in watch-list order.
    pub results: Vec<SignalResult>,
    pub excluded: Vec<Exclusion>,
    /// Symbols never fetched because the scan was cancelled.
    pub skipped: Vec<String>,
    pub requested: usize,
    pub config_fingerprint: String,
    pub benchmark: Option<BenchmarkSummary>,
    pub cache: CacheStats,
    pub scanned_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ScanReport {
    pub fn status(&self) -> ScanStatus {
        if self.results.is_empty() {
            ScanStatus::NoUsableResults
        } else if self.excluded.is_empty() && self.skipped.is_empty() {
            ScanStatus::Complete
        } else {
            ScanStatus::Partial
        }
    }

    /// Results sorted by a caller-supplied comparator. Ties keep watch-list order.
    pub fn ranked<F>(&self, mut compare: F) -> Vec<&SignalResult>
    where
        F: FnMut(&SignalResult, &SignalResult) -> Ordering,
    {
        let mut view: Vec<&SignalResult> = self.results.iter().collect();
        view.sort_by(|a, b| compare(a, b));
        view
    }

    /// Results grouped by sector tag, each group in watch-list order.
    pub fn by_sector(&self) -> BTreeMap<&str, Vec<&SignalResult>> {
        let mut groups: BTreeMap<&str, Vec<&SignalResult>> = BTreeMap::new();
        for result in &self.results {
            let sector = result.sector.as_deref().unwrap_or(UNASSIGNED_SECTOR);
            groups.entry(sector).or_default().push(result);
        }
        groups
    }

    pub fn result_for(&self, symbol: &str) -> Option<&SignalResult> {
        self.results.iter().find(|r| r.symbol == symbol)
    }
}
