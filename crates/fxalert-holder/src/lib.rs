//! Quote caching and aggregation core for the fxalert quote alert bot.
//!
//! - [`QuoteHolder`] - Fetches, caches and aggregates quotes
//! - [`UpdateOutcome`] - What an update did
//! - [`Shutdown`] - Cooperative cancellation signal
//! - [`Clock`] - Time source, swappable in tests

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bucket;
mod clock;
mod holder;
mod pool;
mod shutdown;

pub use clock::{Clock, ManualClock, SystemClock};
pub use holder::{HolderConfig, QuoteHolder, UpdateOutcome};
pub use shutdown::{Shutdown, ShutdownTrigger};
