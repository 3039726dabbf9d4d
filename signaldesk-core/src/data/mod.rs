//! Market data: provider trait, built-in providers and the session cache.

pub mod cache;
pub mod circuit_breaker;
pub mod csv_file;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::{BarCache, CacheKey, CacheStats, CachedProvider};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_file::{read_bars, CsvProvider};
pub use provider::{DataError, DataProvider, DataSource};
pub use synthetic::SyntheticProvider;
pub use yahoo::{SymbolMapping, YahooProvider};
