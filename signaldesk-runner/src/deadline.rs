//! Bounded-time fetches.
//!
//! `DeadlineProvider` runs each fetch on its own thread and gives up after the
//! timeout with `DataError::Timeout`. The abandoned fetch finishes in the
//! background and its result is dropped (a cache underneath may still keep it).

use signaldesk_core::data::{DataError, DataProvider};
use signaldesk_core::domain::BarSeries;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

pub struct DeadlineProvider {
    inner: Arc<dyn DataProvider>,
    timeout: Duration,
}

impl DeadlineProvider {
    pub fn new(inner: Arc<dyn DataProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl DataProvider for DeadlineProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned = symbol.to_string();
        std::thread::Builder::new()
            .name(format!("fetch-{symbol}"))
            .spawn(move || {
                // The receiver is gone if the deadline already passed.
                let _ = tx.send(inner.fetch(&owned, lookback));
            })
            .map_err(|e| DataError::Other(format!("failed to spawn fetch thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(symbol, timeout = ?self.timeout, "fetch deadline exceeded");
                Err(DataError::Timeout {
                    symbol: symbol.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(DataError::Other(format!(
                "fetch thread for '{symbol}' exited without a result"
            ))),
        }
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
