//! CSV file provider: one `{SYMBOL}.csv` per symbol in a directory.
//!
//! Expected header: `date,open,high,low,close,volume` (capitalized names such
//! as Yahoo's download format are accepted too). Rows may be in any order;
//! they are sorted by date before the series is built.

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

impl From<CsvRow> for Bar {
    fn from(row: CsvRow) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.max(0.0).round() as u64,
        }
    }
}

/// Reads bars from local CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// Parse CSV content into date-sorted bars.
pub fn read_bars<R: std::io::Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (line, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|e| {
            DataError::ResponseFormatChanged(format!("row {}: {e}", line + 1))
        })?;
        bars.push(Bar::from(row));
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError> {
        let path = self.path_for(symbol);
        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            Err(e) => return Err(DataError::Io(format!("{}: {e}", path.display()))),
        };

        let bars = read_bars(file)?;
        tracing::debug!(symbol, rows = bars.len(), path = %path.display(), "read csv");
        let series = BarSeries::new(symbol, bars).map_err(|e| DataError::invalid_bars(symbol, e))?;
        Ok(series.tail(lookback))
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_unsorted_rows() {
        let text = "date,open,high,low,close,volume\n\
                    2024-01-03,10.2,10.6,10.0,10.4,1500\n\
                    2024-01-02,10.0,10.5,9.8,10.2,1200\n";
        let bars = read_bars(text.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].volume, 1500);
    }

    #[test]
    fn accepts_capitalized_headers_and_float_volume() {
        let text = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,1234.0\n";
        let bars = read_bars(text.as_bytes()).unwrap();
        assert_eq!(bars[0].volume, 1234);
    }

    #[test]
    fn bad_row_is_format_error() {
        let text = "date,open,high,low,close,volume\nnot-a-date,1,2,0.5,1.5,10\n";
        assert!(matches!(
            read_bars(text.as_bytes()),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }
}
