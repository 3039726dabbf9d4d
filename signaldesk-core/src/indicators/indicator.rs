//! Indicator trait, computed series container and per-bar snapshots.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Every series has the same length as the bar series; NaN marks bars
//! where the indicator's window is not yet satisfied.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Trait for indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on bars after t. Every indicator must
/// produce identical prefixes for a truncated and a full series.
pub trait Indicator: Send + Sync {
    /// Snapshot key (e.g. `SMA_10`, `ATR_14`).
    fn name(&self) -> &str;

    /// Index of the first bar that can hold a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`, NaN where undefined.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Named indicator series computed once per bar series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
    len: usize,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.len = self.len.max(values.len());
        self.series.insert(name.into(), values);
    }

    /// Defined value at `bar_index`; `None` when missing, out of range or NaN.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| v.is_finite())
    }

    /// Full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of bars the series cover.
    pub fn bar_count(&self) -> usize {
        self.len
    }

    /// Snapshot of every defined indicator at `bar_index`.
    pub fn snapshot(&self, bar_index: usize) -> IndicatorSnapshot {
        let values = self
            .series
            .keys()
            .filter_map(|name| self.get(name, bar_index).map(|v| (name.clone(), v)))
            .collect();
        IndicatorSnapshot { values }
    }

    /// Snapshot at the latest bar, if any bars were computed.
    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len.checked_sub(1).map(|i| self.snapshot(i))
    }
}

/// Indicator values at a single bar. Undefined indicators are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSnapshot {
    values: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for IndicatorSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().filter(|(_, v)| v.is_finite()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_filters_nan_and_out_of_range() {
        let mut iv = IndicatorValues::new();
        iv.insert("SMA_3", vec![f64::NAN, f64::NAN, 11.0, 12.0]);
        assert_eq!(iv.get("SMA_3", 0), None);
        assert_eq!(iv.get("SMA_3", 2), Some(11.0));
        assert_eq!(iv.get("SMA_3", 4), None);
        assert_eq!(iv.get("EMA_3", 2), None);
    }

    #[test]
    fn snapshot_contains_only_defined_values() {
        let mut iv = IndicatorValues::new();
        iv.insert("SMA_2", vec![f64::NAN, 1.5, 2.5]);
        iv.insert("SMA_3", vec![f64::NAN, f64::NAN, 2.0]);

        let early = iv.snapshot(1);
        assert_eq!(early.get("SMA_2"), Some(1.5));
        assert!(!early.contains("SMA_3"));

        let latest = iv.latest().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest.get("SMA_3"), Some(2.0));
    }

    #[test]
    fn empty_values_have_no_latest() {
        assert!(IndicatorValues::new().latest().is_none());
    }

    #[test]
    fn snapshot_serializes_as_plain_map() {
        let snap: IndicatorSnapshot = vec![("RSI_14".to_string(), 55.0)].into_iter().collect();
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(json, r#"{"RSI_14":55.0}"#);
    }
}
