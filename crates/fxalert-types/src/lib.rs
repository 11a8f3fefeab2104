//! Core types for the fxalert quote alert bot.
//!
//! This crate provides the fundamental data structures used throughout fxalert:
//!
//! - [`Symbol`] - An uppercase ticker with its price precision
//! - [`Bar`] - A single OHLC observation
//! - [`SymbolSnapshot`] - The previous/current bar pair served for a symbol
//! - [`AlertLevel`] - A user-defined price threshold with a [`Direction`]
//! - [`calendar`] - Hour and trading-day helpers used to key aggregated bars

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
pub mod calendar;
mod error;
mod level;
mod symbol;

pub use bar::{Bar, SymbolSnapshot};
pub use error::{DirectionParseError, QuoteError, Result, SymbolError};
pub use level::{AlertLevel, DeltaId, Direction};
pub use symbol::Symbol;
