//! SignalDesk Core — domain types, indicators, signal engine, market data.
//!
//! This crate contains the per-symbol decision engine:
//! - Domain types (bars, bar series, watch-list entries)
//! - Indicator calculator (SMA, EMA, RSI, MACD, ATR, RVOL)
//! - Crossover event detection
//! - Composite scoring over a declarative factor table
//! - Three-band classification and stop-loss derivation
//! - Data providers (Yahoo, CSV, synthetic) with a TTL cache and circuit breaker

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

pub use config::{ConfigError, EngineConfig, Preset, ThresholdConfig, WindowConfig};
pub use engine::{EngineError, Recommendation, SignalEngine, SignalResult};
