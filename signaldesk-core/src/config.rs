//! Engine configuration: indicator windows, classifier thresholds, stop-loss
//! method and the declarative factor table.
//!
//! One `EngineConfig` describes a complete parameter set. Named presets cover
//! the common families (5/10 swing, 10/20 trend, support-based stops); any of
//! them can be written out as TOML, edited and loaded back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::engine::scoring::{Factor, FactorRule};
use crate::engine::stop_loss::StopMethod;
use crate::indicators::{atr_key, ema_key, rsi_key, rvol_key, sma_key, MacdLine};

/// Invalid configuration. Fatal at setup time; a scan never starts with one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window '{name}' must be >= 1")]
    ZeroWindow { name: &'static str },

    #[error("short MA window ({short}) must be below long MA window ({long})")]
    ShortNotBelowLong { short: usize, long: usize },

    #[error("MACD fast period ({fast}) must be below slow period ({slow})")]
    MacdFastNotBelowSlow { fast: usize, slow: usize },

    #[error("low threshold ({low}) must be below high threshold ({high})")]
    ThresholdOrder { low: i32, high: i32 },

    #[error("stop-loss ATR multiplier must be finite and > 0, got {0}")]
    InvalidMultiplier(f64),

    #[error("support stop lookback must be >= 1")]
    ZeroSupportLookback,

    #[error("support stop buffer must be in [0, 1), got {0}")]
    InvalidBuffer(f64),

    #[error("RSI threshold must be within [0, 100], got {0}")]
    RsiThresholdOutOfRange(f64),

    #[error("volume surge needs min_rvol > 0 and min_close_position in [0, 1]")]
    InvalidVolumeSurge,

    #[error("factor table is empty")]
    EmptyFactorTable,

    #[error("base score and factor weights can reach {extreme}, outside the i32 score range")]
    ScoreRange { extreme: i64 },

    #[error("unknown preset '{0}' (valid: swing, trend, momentum, support)")]
    UnknownPreset(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config I/O error: {0}")]
    Io(String),
}

/// Indicator windows, in bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub short_ma: usize,
    pub long_ma: usize,
    pub trend_ema: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr: usize,
    pub rvol: usize,
    /// Bars used for the symbol-vs-benchmark return comparison.
    pub relative_return: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            short_ma: 5,
            long_ma: 10,
            trend_ema: 60,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr: 14,
            rvol: 20,
            relative_return: 5,
        }
    }
}

impl WindowConfig {
    /// Minimum series length: longest required window plus one bar for the
    /// previous-bar comparison and one for stability.
    ///
    /// Only the crossover pair and ATR are required; the other indicators are
    /// used when their windows are satisfied and ignored otherwise. ATR needs
    /// one extra bar because the first bar has no previous close.
    pub fn required_bars(&self) -> usize {
        self.long_ma.max(self.atr + 1) + 2
    }

    pub fn keys(&self) -> IndicatorKeys {
        IndicatorKeys {
            short_ma: sma_key(self.short_ma),
            long_ma: sma_key(self.long_ma),
            trend: ema_key(self.trend_ema),
            rsi: rsi_key(self.rsi),
            macd_hist: MacdLine::Histogram.key().to_string(),
            atr: atr_key(self.atr),
            rvol: rvol_key(self.rvol),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("short_ma", self.short_ma),
            ("long_ma", self.long_ma),
            ("trend_ema", self.trend_ema),
            ("rsi", self.rsi),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr", self.atr),
            ("rvol", self.rvol),
            ("relative_return", self.relative_return),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(ConfigError::ZeroWindow { name });
        }
        if self.short_ma >= self.long_ma {
            return Err(ConfigError::ShortNotBelowLong {
                short: self.short_ma,
                long: self.long_ma,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdFastNotBelowSlow {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        Ok(())
    }
}

/// Snapshot keys resolved from a `WindowConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorKeys {
    pub short_ma: String,
    pub long_ma: String,
    pub trend: String,
    pub rsi: String,
    pub macd_hist: String,
    pub atr: String,
    pub rvol: String,
}

/// Classifier cut-points on the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Score at or above this is Strong Buy/Hold.
    #[serde(alias = "high_threshold")]
    pub high: i32,
    /// Score at or below this is Reduce/Exit.
    #[serde(alias = "low_threshold")]
    pub low: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self { high: 70, low: 40 }
    }
}

/// Complete engine parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_score: i32,
    pub windows: WindowConfig,
    pub thresholds: ThresholdConfig,
    pub stop: StopMethod,
    pub factors: Vec<FactorRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Preset::Swing.to_config()
    }
}

impl EngineConfig {
    /// Check every window, threshold, multiplier and factor parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.windows.validate()?;

        if self.thresholds.low >= self.thresholds.high {
            return Err(ConfigError::ThresholdOrder {
                low: self.thresholds.low,
                high: self.thresholds.high,
            });
        }

        match self.stop {
            StopMethod::Atr { multiplier } => {
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(ConfigError::InvalidMultiplier(multiplier));
                }
            }
            StopMethod::Support { lookback, buffer } => {
                if lookback == 0 {
                    return Err(ConfigError::ZeroSupportLookback);
                }
                if !(0.0..1.0).contains(&buffer) {
                    return Err(ConfigError::InvalidBuffer(buffer));
                }
            }
        }

        if self.factors.is_empty() {
            return Err(ConfigError::EmptyFactorTable);
        }
        let (lowest, highest) = self.score_bounds();
        for extreme in [lowest, highest] {
            if i32::try_from(extreme).is_err() {
                return Err(ConfigError::ScoreRange { extreme });
            }
        }
        for rule in &self.factors {
            match rule.factor {
                Factor::RsiOverbought { threshold } | Factor::RsiOversold { threshold } => {
                    if !(0.0..=100.0).contains(&threshold) {
                        return Err(ConfigError::RsiThresholdOutOfRange(threshold));
                    }
                }
                Factor::VolumeSurge {
                    min_rvol,
                    min_close_position,
                } => {
                    if !(min_rvol > 0.0) || !(0.0..=1.0).contains(&min_close_position) {
                        return Err(ConfigError::InvalidVolumeSurge);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Lowest and highest score the factor table can produce.
    pub fn score_bounds(&self) -> (i64, i64) {
        let base = i64::from(self.base_score);
        self.factors.iter().fold((base, base), |(lo, hi), rule| {
            let w = i64::from(rule.weight);
            if w < 0 {
                (lo + w, hi)
            } else {
                (lo, hi + w)
            }
        })
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Deterministic BLAKE3 fingerprint of the parameter set.
    ///
    /// Two scans with the same fingerprint used identical windows, weights,
    /// thresholds and stop settings.
    pub fn fingerprint(&self) -> String {
        match serde_json::to_vec(self) {
            Ok(bytes) => blake3::hash(&bytes).to_hex().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "config could not be serialized for fingerprinting");
                String::new()
            }
        }
    }
}

/// Named parameter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// 5/10 day crossover, 1.5×ATR stop.
    Swing,
    /// 10/20 day crossover, heavier crossover and RSI weights, 2×ATR stop.
    Trend,
    /// 5/20 day crossover weighted toward volume surges and MACD momentum.
    Momentum,
    /// 5/20 day crossover with a support stop: min(5-day low, 20-day MA) less 2 %.
    Support,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Swing,
        Preset::Trend,
        Preset::Momentum,
        Preset::Support,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Swing => "swing",
            Preset::Trend => "trend",
            Preset::Momentum => "momentum",
            Preset::Support => "support",
        }
    }

    pub fn to_config(&self) -> EngineConfig {
        match self {
            Preset::Swing => EngineConfig {
                base_score: 50,
                windows: WindowConfig::default(),
                thresholds: ThresholdConfig { high: 70, low: 40 },
                stop: StopMethod::Atr { multiplier: 1.5 },
                factors: canonical_factors(15, 70.0, -15, 30.0),
            },
            Preset::Trend => EngineConfig {
                base_score: 50,
                windows: WindowConfig {
                    short_ma: 10,
                    long_ma: 20,
                    ..WindowConfig::default()
                },
                thresholds: ThresholdConfig { high: 65, low: 35 },
                stop: StopMethod::Atr { multiplier: 2.0 },
                factors: canonical_factors(20, 75.0, -20, 35.0),
            },
            Preset::Momentum => {
                let mut factors = canonical_factors(15, 80.0, -10, 30.0);
                for rule in &mut factors {
                    match rule.factor {
                        Factor::VolumeSurge { .. } => rule.weight = 25,
                        Factor::MacdPositive => rule.weight = 15,
                        _ => {}
                    }
                }
                EngineConfig {
                    base_score: 50,
                    windows: WindowConfig {
                        short_ma: 5,
                        long_ma: 20,
                        ..WindowConfig::default()
                    },
                    thresholds: ThresholdConfig { high: 70, low: 40 },
                    stop: StopMethod::Atr { multiplier: 2.0 },
                    factors,
                }
            }
            Preset::Support => EngineConfig {
                base_score: 50,
                windows: WindowConfig {
                    short_ma: 5,
                    long_ma: 20,
                    ..WindowConfig::default()
                },
                thresholds: ThresholdConfig { high: 75, low: 35 },
                stop: StopMethod::Support {
                    lookback: 5,
                    buffer: 0.02,
                },
                factors: canonical_factors(15, 70.0, -20, 30.0),
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

/// The canonical ten-factor table with the variant-specific knobs exposed.
fn canonical_factors(
    cross_weight: i32,
    overbought: f64,
    overbought_weight: i32,
    oversold: f64,
) -> Vec<FactorRule> {
    vec![
        FactorRule::new(Factor::MaOrder, 10, "bullish MA order"),
        FactorRule::new(Factor::GoldenCross, cross_weight, "crossover confirmed"),
        FactorRule::new(Factor::DeathCross, -cross_weight, "crossover breakdown"),
        FactorRule::new(Factor::PriceAboveShortMa, 10, "holding above short MA"),
        FactorRule::new(Factor::PriceAboveTrend, 10, "above long-term trend line"),
        FactorRule::new(
            Factor::RsiOverbought {
                threshold: overbought,
            },
            overbought_weight,
            "overbought",
        ),
        FactorRule::new(
            Factor::RsiOversold {
                threshold: oversold,
            },
            15,
            "oversold - rebound watch",
        ),
        FactorRule::new(Factor::MacdPositive, 10, "positive momentum"),
        FactorRule::new(
            Factor::VolumeSurge {
                min_rvol: 2.0,
                min_close_position: 0.7,
            },
            20,
            "institutional accumulation",
        ),
        FactorRule::new(Factor::RelativeStrength, 15, "outperforming sector"),
    ]
}
