//! Alert levels and their crossing direction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{DirectionParseError, Symbol};

/// Correlation id shared by the two levels of a delta pair.
pub type DeltaId = Uuid;

/// Which side of the threshold the alert waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Threshold sits below the price at creation; fires when the close
    /// falls to or below it. Written as `<`.
    #[serde(rename = "<")]
    AboveCurrent,
    /// Threshold sits above the price at creation; fires when the close
    /// rises to or above it. Written as `>`.
    #[serde(rename = ">")]
    BelowCurrent,
}

impl Direction {
    /// Returns the command-grammar token for this direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AboveCurrent => "<",
            Self::BelowCurrent => ">",
        }
    }

    /// Returns true if `close` has crossed `threshold` in this direction.
    #[must_use]
    pub fn is_crossed(&self, threshold: f64, close: f64) -> bool {
        match self {
            Self::AboveCurrent => close <= threshold,
            Self::BelowCurrent => close >= threshold,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Self::AboveCurrent),
            ">" => Ok(Self::BelowCurrent),
            other => Err(DirectionParseError(other.to_string())),
        }
    }
}

/// A user-defined price threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLevel {
    /// Watched symbol.
    pub symbol: Symbol,
    /// Threshold price.
    pub price: f64,
    /// Crossing direction.
    pub direction: Direction,
    /// Decimal places used to display and compare the price.
    pub precision: u8,
    /// Set when the level is one half of a delta pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_id: Option<DeltaId>,
}

impl AlertLevel {
    /// Creates a plain level using the symbol's precision.
    #[must_use]
    pub fn new(symbol: Symbol, price: f64, direction: Direction) -> Self {
        let precision = symbol.precision();
        Self {
            symbol,
            price,
            direction,
            precision,
            delta_id: None,
        }
    }

    /// Tags the level with a delta correlation id.
    #[must_use]
    pub const fn with_delta_id(mut self, delta_id: DeltaId) -> Self {
        self.delta_id = Some(delta_id);
        self
    }

    /// Builds the correlated pair `center ± points` sharing one fresh id.
    ///
    /// The upper level waits for the price to rise, the lower for it to fall.
    #[must_use]
    pub fn delta_pair(symbol: &Symbol, center: f64, points: i64) -> [Self; 2] {
        let id = Uuid::new_v4();
        let d = symbol.from_points(points);
        [
            Self::new(symbol.clone(), center + d, Direction::BelowCurrent).with_delta_id(id),
            Self::new(symbol.clone(), center - d, Direction::AboveCurrent).with_delta_id(id),
        ]
    }

    /// Returns true if `close` triggers this level.
    #[must_use]
    pub fn is_alert(&self, close: f64) -> bool {
        self.direction.is_crossed(self.price, close)
    }

    /// Returns the price rounded to the level's precision.
    ///
    /// Two levels with the same symbol, direction and price key are
    /// considered the same alert.
    #[must_use]
    pub fn price_key(&self) -> String {
        format!("{:.*}", usize::from(self.precision), self.price)
    }

    /// Returns true if `other` describes the same threshold.
    #[must_use]
    pub fn same_level(&self, other: &Self) -> bool {
        self.symbol == other.symbol
            && self.direction == other.direction
            && self.price_key() == other.price_key()
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.symbol, self.direction, self.price_key())
    }
}
