//! Ranking views over scan results.
//!
//! Comparators are plain functions so callers can pass their own to
//! `ScanReport::ranked`; `RankBy` names the built-in ones.

use serde::{Deserialize, Serialize};
use signaldesk_core::SignalResult;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::report::ScanReport;

/// Highest score first.
pub fn by_score_desc(a: &SignalResult, b: &SignalResult) -> Ordering {
    b.score.cmp(&a.score)
}

/// Strongest return relative to the benchmark first; missing values last.
///
/// Without a benchmark the raw period return is used: every symbol shares the
/// same baseline, so the order is the same.
pub fn by_relative_return_desc(a: &SignalResult, b: &SignalResult) -> Ordering {
    let key = |r: &SignalResult| r.relative_return.or(r.period_return);
    match (key(a), key(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Watch-list order.
    #[default]
    Input,
    Score,
    RelativeReturn,
}

impl RankBy {
    pub fn apply<'a>(&self, report: &'a ScanReport) -> Vec<&'a SignalResult> {
        match self {
            RankBy::Input => report.results.iter().collect(),
            RankBy::Score => report.ranked(by_score_desc),
            RankBy::RelativeReturn => report.ranked(by_relative_return_desc),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RankBy::Input => "input",
            RankBy::Score => "score",
            RankBy::RelativeReturn => "relative",
        }
    }
}

impl fmt::Display for RankBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(RankBy::Input),
            "score" => Ok(RankBy::Score),
            "relative" | "relative_return" => Ok(RankBy::RelativeReturn),
            other => Err(format!(
                "unknown ranking '{other}' (valid: input, score, relative)"
            )),
        }
    }
}
