//! Watch-list entries and the free-text parser that produces them.
//!
//! Accepted text: entries separated by commas (ASCII or full-width),
//! semicolons or newlines. Each entry is `code`, `code|name` or
//! `code|name|sector`. Codes that fail the format check are dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One symbol to scan, with optional display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl WatchlistEntry {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            sector: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Name to show in reports; falls back to the code.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }
}

/// Code validation rules applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchlistFormat {
    /// Required code length; `None` accepts any non-empty code.
    pub code_len: Option<usize>,
    /// Require every character of the code to be an ASCII digit.
    pub numeric_only: bool,
}

impl Default for WatchlistFormat {
    /// Six-digit exchange codes (e.g. `600519`).
    fn default() -> Self {
        Self {
            code_len: Some(6),
            numeric_only: true,
        }
    }
}

impl WatchlistFormat {
    /// Accept any ticker-like code (`AAPL`, `BRK-B`, `0700.HK`).
    pub fn any_symbol() -> Self {
        Self {
            code_len: None,
            numeric_only: false,
        }
    }

    pub fn accepts(&self, code: &str) -> bool {
        if code.is_empty() || code.chars().any(char::is_whitespace) {
            return false;
        }
        if let Some(len) = self.code_len {
            if code.chars().count() != len {
                return false;
            }
        }
        !self.numeric_only || code.chars().all(|c| c.is_ascii_digit())
    }
}

/// Parse free-form watch-list text into ordered, de-duplicated entries.
pub fn parse_watchlist(text: &str, format: &WatchlistFormat) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for raw in text.split(|c| matches!(c, ',' | '，' | ';' | '\n' | '\r')) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let mut parts = raw.split('|').map(str::trim);
        let code = parts.next().unwrap_or_default().to_uppercase();
        if !format.accepts(&code) {
            tracing::debug!(entry = raw, "dropping watch-list entry with invalid code");
            continue;
        }
        if !seen.insert(code.clone()) {
            continue;
        }

        let name = parts.next().filter(|s| !s.is_empty()).map(String::from);
        let sector = parts.next().filter(|s| !s.is_empty()).map(String::from);
        entries.push(WatchlistEntry { code, name, sector });
    }

    entries
}
