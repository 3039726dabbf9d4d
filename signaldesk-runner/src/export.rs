//! Report export — JSON and CSV artifacts.
//!
//! - **JSON**: the full `ScanReport`, including exclusions and the config fingerprint
//! - **CSV**: one row per result, for spreadsheets

use std::io::Write;

use signaldesk_core::SignalResult;
use thiserror::Error;

use crate::report::ScanReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn report_to_json(report: &ScanReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_json<W: Write>(report: &ScanReport, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

// ─── CSV export ─────────────────────────────────────────────────────

const CSV_HEADER: [&str; 15] = [
    "symbol",
    "name",
    "sector",
    "as_of",
    "last_price",
    "change_pct",
    "period_return",
    "relative_return",
    "score",
    "recommendation",
    "event",
    "stop_loss",
    "active_stop",
    "stop_breached",
    "rationale",
];

fn opt(v: Option<f64>, precision: usize) -> String {
    v.map(|x| format!("{x:.precision$}")).unwrap_or_default()
}

/// Write results as CSV in the order given. Rationale tags are joined with `; `.
pub fn write_csv<'a, W, I>(results: I, writer: W) -> Result<(), ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a SignalResult>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for r in results {
        wtr.write_record([
            r.symbol.as_str(),
            r.name.as_str(),
            r.sector.as_deref().unwrap_or(""),
            &r.as_of.to_string(),
            &format!("{:.4}", r.last_price),
            &opt(r.change_pct, 4),
            &opt(r.period_return, 6),
            &opt(r.relative_return, 6),
            &r.score.to_string(),
            r.recommendation.label(),
            r.event.map(|e| e.tag()).unwrap_or(""),
            &opt(r.stop_loss, 4),
            &opt(r.active_stop, 4),
            if r.stop_breached { "true" } else { "false" },
            &r.rationale.join("; "),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn results_to_csv<'a, I>(results: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a SignalResult>,
{
    let mut buf = Vec::new();
    write_csv(results, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
