//! SignalDesk Runner — watch-list scanning, deadlines, ranking, export.
//!
//! This crate builds on `signaldesk-core` to provide:
//! - Scan sessions with a per-session bar cache and bounded-time fetches
//! - Parallel, order-preserving evaluation with typed exclusions
//! - Ranking views and sector grouping
//! - JSON and CSV export of scan reports

pub mod deadline;
pub mod export;
pub mod options;
pub mod ranking;
pub mod report;
pub mod scanner;

pub use deadline::DeadlineProvider;
pub use export::{report_to_json, results_to_csv, write_csv, write_json, ExportError};
pub use options::ScanOptions;
pub use ranking::{by_relative_return_desc, by_score_desc, RankBy};
pub use report::{
    BenchmarkSummary, Exclusion, ExclusionReason, ScanReport, ScanStatus, UNASSIGNED_SECTOR,
};
pub use scanner::{ScanError, Scanner};
