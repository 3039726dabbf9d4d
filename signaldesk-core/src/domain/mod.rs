//! Domain types for SignalDesk

pub mod bar;
pub mod watchlist;

pub use bar::{Bar, BarError, BarSeries};
pub use watchlist::{parse_watchlist, WatchlistEntry, WatchlistFormat};
