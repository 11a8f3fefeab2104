//! Per-user alert persistence for the fxalert quote alert bot.
//!
//! - [`AlertStore`] - Alert levels and settings keyed by user id
//! - [`UserSettings`] - Per-user preferences
//! - [`StoreError`] - Load and save failures

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod store;

pub use error::{Result, StoreError};
pub use store::{AlertStore, UserId, UserSettings};
