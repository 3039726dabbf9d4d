//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Constant series — SMA equals the constant, ATR is zero, RVOL is one
//! 2. Crossover exclusivity — golden and death never fire together
//! 3. Score additivity — permuting the factor table leaves the score unchanged
//! 4. No look-ahead — a truncated series yields the same indicator prefix
//! 5. Bounds — RSI stays in [0, 100]; the ATR stop is exactly close - k*ATR

use chrono::NaiveDate;
use proptest::prelude::*;
use signaldesk_core::config::{EngineConfig, WindowConfig};
use signaldesk_core::domain::Bar;
use signaldesk_core::engine::{
    atr_stop, classify, detect_cross, score, CrossEvent, ScoringContext,
};
use signaldesk_core::indicators::{
    Atr, Indicator, IndicatorSet, IndicatorSnapshot, RelativeVolume, Rsi, Sma,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), min..max)
}

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1_000 + (i as u64 * 37) % 900,
            }
        })
        .collect()
}

fn flat_bars(price: f64, n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 5_000,
        })
        .collect()
}

// ── 1. Constant series ───────────────────────────────────────────────

proptest! {
    #[test]
    fn constant_series_indicators(price in arb_price(), n in 25usize..80) {
        let bars = flat_bars(price, n);

        let sma = Sma::new(10).compute(&bars);
        for v in &sma[9..] {
            prop_assert!((v - price).abs() < 1e-9 * price.max(1.0));
        }

        let atr = Atr::new(14).compute(&bars);
        for v in &atr[14..] {
            prop_assert!(v.abs() < 1e-12);
        }

        let rvol = RelativeVolume::new(20).compute(&bars);
        for v in &rvol[20..] {
            prop_assert!((v - 1.0).abs() < 1e-12);
        }
    }
}

// ── 2. Crossover exclusivity ─────────────────────────────────────────

proptest! {
    #[test]
    fn crosses_are_mutually_exclusive(
        ps in arb_price(), pl in arb_price(), cs in arb_price(), cl in arb_price()
    ) {
        let event = detect_cross(ps, pl, cs, cl);
        match event {
            Some(CrossEvent::Golden) => prop_assert!(ps <= pl && cs > cl),
            Some(CrossEvent::Death) => prop_assert!(ps >= pl && cs < cl),
            None => prop_assert!(!(ps <= pl && cs > cl) && !(ps >= pl && cs < cl)),
        }
    }

    #[test]
    fn equal_on_latest_bar_never_fires(ps in arb_price(), pl in arb_price(), c in arb_price()) {
        prop_assert_eq!(detect_cross(ps, pl, c, c), None);
    }
}

// ── 3. Score additivity ──────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_order_invariant(
        rules in Just(EngineConfig::default().factors).prop_shuffle(),
        short in arb_price(),
        long in arb_price(),
        trend in arb_price(),
        rsi in 0.0..100.0_f64,
        hist in -2.0..2.0_f64,
        rvol in 0.0..5.0_f64,
        close in arb_price(),
        own in -0.2..0.2_f64,
        bench in -0.2..0.2_f64,
        golden in any::<bool>(),
    ) {
        let keys = WindowConfig::default().keys();
        let latest: IndicatorSnapshot = vec![
            (keys.short_ma.clone(), short),
            (keys.long_ma.clone(), long),
            (keys.trend.clone(), trend),
            (keys.rsi.clone(), rsi),
            (keys.macd_hist.clone(), hist),
            (keys.rvol.clone(), rvol),
        ]
        .into_iter()
        .collect();
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            open: close,
            high: close * 1.02,
            low: close * 0.97,
            close,
            volume: 1_000,
        };
        let ctx = ScoringContext {
            keys: &keys,
            latest: &latest,
            bar: &bar,
            event: golden.then_some(CrossEvent::Golden),
            symbol_return: Some(own),
            benchmark_return: Some(bench),
        };

        let canonical = score(50, &EngineConfig::default().factors, &ctx);
        let shuffled = score(50, &rules, &ctx);
        prop_assert_eq!(canonical.total, shuffled.total);

        let thresholds = EngineConfig::default().thresholds;
        prop_assert_eq!(
            classify(canonical.total, ctx.event, &thresholds),
            classify(shuffled.total, ctx.event, &thresholds)
        );
    }
}

// ── 4. No look-ahead ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn truncation_preserves_prefix(closes in arb_closes(40, 90), cut in 20usize..40) {
        let bars = bars_from_closes(&closes);
        let set = IndicatorSet::from_windows(&WindowConfig::default());
        let full = set.compute(&bars);
        let partial = set.compute(&bars[..cut]);

        for name in set.names() {
            let a = full.get_series(name).unwrap();
            let b = partial.get_series(name).unwrap();
            for i in 0..cut {
                prop_assert!(
                    (a[i].is_nan() && b[i].is_nan()) || (a[i] - b[i]).abs() < 1e-9,
                    "{} differs at {}: {} vs {}", name, i, a[i], b[i]
                );
            }
        }
    }
}

// ── 5. Bounds ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(16, 120)) {
        let bars = bars_from_closes(&closes);
        for v in Rsi::new(14).compute(&bars).into_iter().filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(&v), "RSI out of bounds: {}", v);
        }
    }

    #[test]
    fn atr_stop_is_exact(close in arb_price(), atr in 0.0..50.0_f64, k in 0.5..4.0_f64) {
        prop_assert_eq!(atr_stop(close, atr, k), close - k * atr);
    }
}
