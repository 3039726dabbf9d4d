//! Composite score from a declarative factor table.
//!
//! Each `FactorRule` pairs a condition with a signed weight and a rationale
//! tag. Every rule is evaluated and the deltas of those that fire are added to
//! the base score. There is no early exit and no clamping.

use serde::{Deserialize, Serialize};

use super::events::CrossEvent;
use crate::config::IndicatorKeys;
use crate::domain::Bar;
use crate::indicators::IndicatorSnapshot;

/// A scoring condition and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Factor {
    /// Short SMA strictly above long SMA.
    MaOrder,
    GoldenCross,
    DeathCross,
    /// Close strictly above the short SMA.
    PriceAboveShortMa,
    /// Close strictly above the long-horizon trend EMA.
    PriceAboveTrend,
    RsiOverbought { threshold: f64 },
    RsiOversold { threshold: f64 },
    /// MACD histogram strictly positive.
    MacdPositive,
    /// RVOL above `min_rvol` with the close in the upper part of the day's range.
    VolumeSurge { min_rvol: f64, min_close_position: f64 },
    /// Symbol return over the comparison window beats the benchmark's.
    RelativeStrength,
}

impl Factor {
    /// Whether the condition holds. Missing inputs never fire.
    pub fn fires(&self, ctx: &ScoringContext<'_>) -> bool {
        let get = |key: &str| ctx.latest.get(key);
        let close = ctx.bar.close;
        match *self {
            Factor::MaOrder => match (get(&ctx.keys.short_ma), get(&ctx.keys.long_ma)) {
                (Some(short), Some(long)) => short > long,
                _ => false,
            },
            Factor::GoldenCross => ctx.event == Some(CrossEvent::Golden),
            Factor::DeathCross => ctx.event == Some(CrossEvent::Death),
            Factor::PriceAboveShortMa => get(&ctx.keys.short_ma).is_some_and(|ma| close > ma),
            Factor::PriceAboveTrend => get(&ctx.keys.trend).is_some_and(|ema| close > ema),
            Factor::RsiOverbought { threshold } => {
                get(&ctx.keys.rsi).is_some_and(|rsi| rsi >= threshold)
            }
            Factor::RsiOversold { threshold } => {
                get(&ctx.keys.rsi).is_some_and(|rsi| rsi <= threshold)
            }
            Factor::MacdPositive => get(&ctx.keys.macd_hist).is_some_and(|h| h > 0.0),
            Factor::VolumeSurge {
                min_rvol,
                min_close_position,
            } => {
                get(&ctx.keys.rvol).is_some_and(|rvol| rvol > min_rvol)
                    && ctx.bar.close_position() > min_close_position
            }
            Factor::RelativeStrength => match (ctx.symbol_return, ctx.benchmark_return) {
                (Some(own), Some(bench)) => own > bench,
                _ => false,
            },
        }
    }
}

/// One row of the factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRule {
    #[serde(flatten)]
    pub factor: Factor,
    pub weight: i32,
    pub tag: String,
}

impl FactorRule {
    pub fn new(factor: Factor, weight: i32, tag: impl Into<String>) -> Self {
        Self {
            factor,
            weight,
            tag: tag.into(),
        }
    }
}

/// Everything a factor may look at for one symbol's latest bar.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub keys: &'a IndicatorKeys,
    pub latest: &'a IndicatorSnapshot,
    pub bar: &'a Bar,
    pub event: Option<CrossEvent>,
    pub symbol_return: Option<f64>,
    pub benchmark_return: Option<f64>,
}

/// A fired rule's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub factor: Factor,
    pub delta: i32,
    pub tag: String,
}

/// Composite score with its per-factor breakdown, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub base: i32,
    pub total: i32,
    pub contributions: Vec<Contribution>,
}

impl ScoreCard {
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.contributions.iter().map(|c| c.tag.as_str())
    }
}

/// Evaluate every rule against `ctx` and sum the deltas of those that fire.
pub fn score(base: i32, rules: &[FactorRule], ctx: &ScoringContext<'_>) -> ScoreCard {
    let contributions: Vec<Contribution> = rules
        .iter()
        .filter(|rule| rule.factor.fires(ctx))
        .map(|rule| Contribution {
            factor: rule.factor,
            delta: rule.weight,
            tag: rule.tag.clone(),
        })
        .collect();
    let total = contributions
        .iter()
        .fold(base, |acc, c| acc.saturating_add(c.delta));
    ScoreCard {
        base,
        total,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, WindowConfig};
    use chrono::NaiveDate;

    fn bar(low: f64, high: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 10_000,
        }
    }

    fn snapshot(values: &[(&str, f64)]) -> IndicatorSnapshot {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn run(
        snap: &IndicatorSnapshot,
        bar: &Bar,
        event: Option<CrossEvent>,
        returns: (Option<f64>, Option<f64>),
    ) -> ScoreCard {
        let config = EngineConfig::default();
        let keys = WindowConfig::default().keys();
        let ctx = ScoringContext {
            keys: &keys,
            latest: snap,
            bar,
            event,
            symbol_return: returns.0,
            benchmark_return: returns.1,
        };
        score(config.base_score, &config.factors, &ctx)
    }

    #[test]
    fn nothing_fires_on_neutral_inputs() {
        let snap = snapshot(&[
            ("SMA_5", 50.0),
            ("SMA_10", 50.0),
            ("RSI_14", 50.0),
            ("RVOL_20", 1.0),
        ]);
        let card = run(&snap, &bar(50.0, 50.0, 50.0), None, (None, None));
        assert_eq!(card.total, 50);
        assert!(card.contributions.is_empty());
    }

    #[test]
    fn bullish_setup_accumulates() {
        let snap = snapshot(&[
            ("SMA_5", 10.2),
            ("SMA_10", 10.0),
            ("EMA_60", 9.0),
            ("RSI_14", 60.0),
            ("MACD_HIST", 0.05),
            ("RVOL_20", 2.5),
        ]);
        let card = run(
            &snap,
            &bar(10.0, 11.0, 10.9),
            Some(CrossEvent::Golden),
            (Some(0.08), Some(0.02)),
        );
        // 50 + MA order 10 + golden 15 + above short 10 + above trend 10
        //    + MACD 10 + volume surge 20 + relative strength 15
        assert_eq!(card.total, 140);
        let tags: Vec<&str> = card.tags().collect();
        assert_eq!(
            tags,
            vec![
                "bullish MA order",
                "crossover confirmed",
                "holding above short MA",
                "above long-term trend line",
                "positive momentum",
                "institutional accumulation",
                "outperforming sector",
            ]
        );
    }

    #[test]
    fn rsi_thresholds_are_inclusive() {
        let overbought = run(
            &snapshot(&[("RSI_14", 70.0)]),
            &bar(1.0, 2.0, 1.5),
            None,
            (None, None),
        );
        assert_eq!(overbought.total, 35);

        let oversold = run(
            &snapshot(&[("RSI_14", 30.0)]),
            &bar(1.0, 2.0, 1.5),
            None,
            (None, None),
        );
        assert_eq!(oversold.total, 65);
    }

    #[test]
    fn flat_day_never_counts_as_accumulation() {
        let snap = snapshot(&[("RVOL_20", 5.0)]);
        let card = run(&snap, &bar(20.0, 20.0, 20.0), None, (None, None));
        assert_eq!(card.total, 50);
    }

    #[test]
    fn weak_close_blocks_volume_surge() {
        let snap = snapshot(&[("RVOL_20", 3.0)]);
        let card = run(&snap, &bar(10.0, 11.0, 10.5), None, (None, None));
        assert_eq!(card.total, 50);
    }

    #[test]
    fn death_cross_subtracts() {
        let snap = snapshot(&[("SMA_5", 9.8), ("SMA_10", 10.0)]);
        let card = run(&snap, &bar(9.0, 10.0, 9.5), Some(CrossEvent::Death), (None, None));
        assert_eq!(card.total, 35);
        assert_eq!(card.contributions[0].tag, "crossover breakdown");
    }

    #[test]
    fn relative_strength_needs_both_returns() {
        let snap = IndicatorSnapshot::default();
        let b = bar(1.0, 2.0, 1.5);
        assert_eq!(run(&snap, &b, None, (Some(0.1), None)).total, 50);
        assert_eq!(run(&snap, &b, None, (Some(0.1), Some(0.0))).total, 65);
        assert_eq!(run(&snap, &b, None, (Some(0.0), Some(0.0))).total, 50);
    }

    #[test]
    fn score_is_not_clamped() {
        let snap = snapshot(&[("RSI_14", 90.0), ("SMA_5", 9.0), ("SMA_10", 10.0)]);
        let rules = vec![FactorRule::new(
            Factor::RsiOverbought { threshold: 70.0 },
            -80,
            "overbought",
        )];
        let keys = WindowConfig::default().keys();
        let b = bar(8.0, 9.0, 8.5);
        let ctx = ScoringContext {
            keys: &keys,
            latest: &snap,
            bar: &b,
            event: None,
            symbol_return: None,
            benchmark_return: None,
        };
        assert_eq!(score(50, &rules, &ctx).total, -30);
    }

    #[test]
    fn factor_rule_serializes_flat() {
        let rule = FactorRule::new(Factor::RsiOversold { threshold: 30.0 }, 15, "oversold");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "rsi_oversold");
        assert_eq!(json["threshold"], 30.0);
        assert_eq!(json["weight"], 15);
    }

    #[test]
    fn oversized_weights_saturate_instead_of_wrapping() {
        let snap = snapshot(&[("SMA_5", 10.2), ("SMA_10", 10.0), ("MACD_HIST", 0.5)]);
        let rules = vec![
            FactorRule::new(Factor::MaOrder, i32::MAX, "a"),
            FactorRule::new(Factor::MacdPositive, i32::MAX, "b"),
        ];
        let keys = WindowConfig::default().keys();
        let b = bar(10.0, 11.0, 10.5);
        let ctx = ScoringContext {
            keys: &keys,
            latest: &snap,
            bar: &b,
            event: None,
            symbol_return: None,
            benchmark_return: None,
        };
        let card = score(50, &rules, &ctx);
        assert_eq!(card.contributions.len(), 2);
        assert_eq!(card.total, i32::MAX);
    }
}
