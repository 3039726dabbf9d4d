//! Data provider and cache integration tests.

use chrono::NaiveDate;
use signaldesk_core::data::{
    BarCache, CacheKey, CachedProvider, CsvProvider, DataError, DataProvider, SyntheticProvider,
};
use signaldesk_core::domain::BarSeries;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

fn write_csv(dir: &std::path::Path, symbol: &str, rows: &[&str]) {
    let mut f = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
    writeln!(f, "date,open,high,low,close,volume").unwrap();
    for row in rows {
        writeln!(f, "{row}").unwrap();
    }
}

// ── CSV ──────────────────────────────────────────────────────────────

#[test]
fn csv_provider_returns_latest_lookback_bars() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<String> = (1..=20)
        .map(|d| format!("2024-03-{d:02},10.0,10.5,9.5,10.{d:02},1000"))
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    write_csv(dir.path(), "600519", &refs);

    let provider = CsvProvider::new(dir.path());
    assert!(provider.is_available());
    let series = provider.fetch("600519", 5).unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(series.symbol(), "600519");
    assert_eq!(
        series.last().unwrap().date,
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    );
}

#[test]
fn csv_missing_file_is_symbol_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CsvProvider::new(dir.path());
    assert_eq!(
        provider.fetch("000001", 30).unwrap_err(),
        DataError::SymbolNotFound {
            symbol: "000001".into()
        }
    );
}

#[test]
fn csv_duplicate_dates_are_invalid_bars() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "000002",
        &[
            "2024-03-01,10,11,9,10,100",
            "2024-03-01,10,11,9,10.5,100",
        ],
    );
    let err = CsvProvider::new(dir.path()).fetch("000002", 30).unwrap_err();
    assert!(matches!(err, DataError::InvalidBars { .. }));
}

#[test]
fn csv_inverted_range_is_invalid_bars() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "000003", &["2024-03-01,10,9,11,10,100"]);
    let err = CsvProvider::new(dir.path()).fetch("000003", 30).unwrap_err();
    assert!(matches!(err, DataError::InvalidBars { .. }));
}

#[test]
fn csv_provider_unavailable_without_directory() {
    let provider = CsvProvider::new("/definitely/not/a/dir");
    assert!(!provider.is_available());
}

// ── Synthetic ────────────────────────────────────────────────────────

#[test]
fn synthetic_is_deterministic_across_instances() {
    let end = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
    let a = SyntheticProvider::new(end).fetch("600519", 60).unwrap();
    let b = SyntheticProvider::new(end).fetch("600519", 60).unwrap();
    assert_eq!(a, b);
}

// ── Cache ────────────────────────────────────────────────────────────

/// Provider that counts fetches and sleeps to widen the race window.
struct SlowCounting {
    inner: SyntheticProvider,
    calls: AtomicUsize,
    delay: Duration,
}

impl DataProvider for SlowCounting {
    fn name(&self) -> &str {
        "slow"
    }

    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.inner.fetch(symbol, lookback)
    }
}

fn slow_provider() -> Arc<SlowCounting> {
    Arc::new(SlowCounting {
        inner: SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()),
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(50),
    })
}

#[test]
fn concurrent_requests_coalesce_to_one_fetch() {
    let slow = slow_provider();
    let cache = Arc::new(BarCache::new(Duration::from_secs(60)));
    let provider = Arc::new(CachedProvider::new(Arc::clone(&slow), Arc::clone(&cache)));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                provider.fetch("600519", 60).unwrap()
            })
        })
        .collect();

    let results: Vec<BarSeries> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, threads as u64 - 1);
}

#[test]
fn distinct_keys_fetch_independently() {
    let slow = slow_provider();
    let cache = Arc::new(BarCache::new(Duration::from_secs(60)));
    let provider = CachedProvider::new(Arc::clone(&slow), cache);

    provider.fetch("600519", 60).unwrap();
    provider.fetch("600519", 120).unwrap();
    provider.fetch("000001", 60).unwrap();
    provider.fetch("600519", 60).unwrap();
    assert_eq!(slow.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn expired_entries_are_refetched() {
    let slow = slow_provider();
    let cache = Arc::new(BarCache::new(Duration::from_millis(20)));
    let provider = CachedProvider::new(Arc::clone(&slow), Arc::clone(&cache));

    provider.fetch("600519", 30).unwrap();
    std::thread::sleep(Duration::from_millis(30));
    provider.fetch("600519", 30).unwrap();
    assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn invalidation_forces_refetch() {
    let slow = slow_provider();
    let cache = Arc::new(BarCache::new(Duration::from_secs(60)));
    let provider = CachedProvider::new(Arc::clone(&slow), Arc::clone(&cache));

    provider.fetch("600519", 30).unwrap();
    assert!(cache.invalidate(&CacheKey::new("600519", 30)));
    provider.fetch("600519", 30).unwrap();
    assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
}
