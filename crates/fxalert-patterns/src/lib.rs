//! Candlestick pattern recognition for the fxalert quote alert bot.
//!
//! - [`classify`] - Find the pattern a closed bar forms, if any
//! - [`Pattern`] - A recognized pattern and its sentiment

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use fxalert_types::Bar;
use serde::{Deserialize, Serialize};

/// Minimum share of the range, in percent, one wick needs for a pin bar.
pub const PIN_BAR_PERCENT: f64 = 65.0;

/// Minimum share of the range, in percent, both wicks need for a star bar.
pub const STAR_BAR_PERCENT: f64 = 33.0;

/// Shape of a recognized bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// One long wick rejecting a price extreme.
    PinBar,
    /// Long wicks on both sides of a small body.
    StarBar,
}

impl PatternKind {
    /// Returns the lowercase name used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PinBar => "pinbar",
            Self::StarBar => "starbar",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market bias a pattern suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Rejection of lower prices.
    Bull,
    /// Rejection of higher prices.
    Bear,
    /// Indecision.
    Neutral,
}

impl Sentiment {
    /// Returns the lowercase name used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Bear => "bear",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    /// Shape of the bar.
    pub kind: PatternKind,
    /// Bias the shape suggests.
    pub sentiment: Sentiment,
}

impl Pattern {
    /// Creates a pattern.
    #[must_use]
    pub const fn new(kind: PatternKind, sentiment: Sentiment) -> Self {
        Self { kind, sentiment }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.sentiment)
    }
}

/// Wick lengths as percentages of the bar range.
struct WickShares {
    upper: f64,
    lower: f64,
}

impl WickShares {
    fn of(bar: &Bar) -> Option<Self> {
        let range = bar.range();
        if !range.is_finite() || range <= 0.0 {
            return None;
        }
        Some(Self {
            upper: bar.upper_wick() * 100.0 / range,
            lower: bar.lower_wick() * 100.0 / range,
        })
    }
}

/// Classifies a closed bar.
///
/// Pin bars take precedence over star bars. An upper wick of at least
/// [`PIN_BAR_PERCENT`] of the range is bearish, otherwise a lower wick of at
/// least that share is bullish. A bar whose wicks both reach
/// [`STAR_BAR_PERCENT`] is a neutral star bar. Bars with a zero, negative or
/// non-finite range never match.
#[must_use]
pub fn classify(bar: &Bar) -> Option<Pattern> {
    let shares = WickShares::of(bar)?;
    pin_bar(&shares).or_else(|| star_bar(&shares))
}

fn pin_bar(shares: &WickShares) -> Option<Pattern> {
    if shares.upper >= PIN_BAR_PERCENT {
        Some(Pattern::new(PatternKind::PinBar, Sentiment::Bear))
    } else if shares.lower >= PIN_BAR_PERCENT {
        Some(Pattern::new(PatternKind::PinBar, Sentiment::Bull))
    } else {
        None
    }
}

fn star_bar(shares: &WickShares) -> Option<Pattern> {
    (shares.upper >= STAR_BAR_PERCENT && shares.lower >= STAR_BAR_PERCENT)
        .then(|| Pattern::new(PatternKind::StarBar, Sentiment::Neutral))
}
