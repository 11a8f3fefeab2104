//! Chat command grammar.
//!
//! Commands are case-insensitive and whitespace-tolerant:
//!
//! ```text
//! /add EURUSD > 1.2550
//! /del EURUSD < 1.2550
//! /del EUR
//! /del *
//! /del
//! /ls USD
//! /delta USDJPY 500
//! /delta 500
//! /help
//! ```

use fxalert_types::{AlertLevel, Direction, Symbol};

use crate::ParseError;

const ADD: &str = "/add";
const DELETE: &str = "/del";
const LIST: &str = "/ls";
const DELTA: &str = "/delta";
const HELP: &str = "/help";

/// Matches every symbol in a filter.
pub const ANY_SYMBOL: &str = "*";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Store a level alert.
    Add(AlertLevel),
    /// Offer a keyboard of stored alerts to delete.
    DeleteKeyboard,
    /// Delete every alert whose symbol contains the filter (`*` for all).
    DeleteMatching(String),
    /// Delete one level alert.
    Delete(AlertLevel),
    /// List stored alerts, optionally filtered by symbol substring.
    List(Option<String>),
    /// Set the user's delta and create a level pair around the current
    /// price of every matching symbol.
    Delta {
        /// Symbol or substring filter; `None` matches every symbol.
        filter: Option<String>,
        /// Distance from the current price, in points.
        points: i64,
    },
    /// Show usage.
    Help,
}

impl Command {
    /// Parses a chat message.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the text is not a well-formed command.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.to_lowercase();
        let parts: Vec<&str> = text.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Err(ParseError::UnknownCommand(String::new()));
        };

        match name {
            ADD => parse_level(args, "/add SYMBOL <|> PRICE").map(Self::Add),
            DELETE => match args {
                [] => Ok(Self::DeleteKeyboard),
                [filter] => Ok(Self::DeleteMatching(filter.to_ascii_uppercase())),
                _ => parse_level(args, "/del SYMBOL <|> PRICE").map(Self::Delete),
            },
            LIST => match args {
                [] => Ok(Self::List(None)),
                [filter] => Ok(Self::List(Some(filter.to_ascii_uppercase()))),
                _ => Err(ParseError::Format("/ls [FILTER]")),
            },
            DELTA => match args {
                [points] => Ok(Self::Delta {
                    filter: None,
                    points: parse_points(points)?,
                }),
                [filter, points] => Ok(Self::Delta {
                    filter: Some(filter.to_ascii_uppercase()),
                    points: parse_points(points)?,
                }),
                _ => Err(ParseError::Format("/delta [FILTER] POINTS")),
            },
            HELP if args.is_empty() => Ok(Self::Help),
            _ => Err(ParseError::UnknownCommand(name.to_string())),
        }
    }
}

fn parse_level(args: &[&str], usage: &'static str) -> Result<AlertLevel, ParseError> {
    let [symbol, direction, price] = args else {
        return Err(ParseError::Format(usage));
    };
    let symbol = Symbol::new(symbol)?;
    let direction: Direction = direction.parse()?;
    let price = parse_price(price)?;
    Ok(AlertLevel::new(symbol, price, direction))
}

fn parse_price(raw: &str) -> Result<f64, ParseError> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| ParseError::Price(raw.to_string()))
}

fn parse_points(raw: &str) -> Result<i64, ParseError> {
    raw.parse::<i64>()
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| ParseError::Points(raw.to_string()))
}

/// Returns true if `symbol` is selected by a user filter.
///
/// Filters are upper-case substrings; [`ANY_SYMBOL`] selects everything.
#[must_use]
pub fn filter_matches(filter: &str, symbol: &Symbol) -> bool {
    filter == ANY_SYMBOL || symbol.as_str().contains(filter)
}

/// Usage text sent in answer to `/help` and to malformed commands.
#[must_use]
pub fn help_text() -> String {
    let above = Direction::AboveCurrent;
    let below = Direction::BelowCurrent;
    format!(
        "
Add: {ADD} EURUSD {above} 1.2550
Add: {ADD} EURUSD {below} 1.2550

Delete: {DELETE} EURUSD {below} 1.2550
Delete: {DELETE} EURUSD
Delete: {DELETE} EUR
Delete: {DELETE} {ANY_SYMBOL}

Keyboard delete: {DELETE}

List: {LIST}
List: {LIST} USD

Delta: {DELTA} USDJPY 500
Delta: {DELTA} USD 500
Delta: {DELTA} 500

Help: {HELP}
"
    )
}
