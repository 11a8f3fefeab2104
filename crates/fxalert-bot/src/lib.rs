//! Chat bot, alert evaluation and scheduling for fxalert.
//!
//! - [`Command`] - Chat command grammar
//! - [`TelegramClient`] - Bot API transport behind [`ChatTransport`]
//! - [`Evaluator`] - Level and momentum alert passes
//! - [`PatternScanner`] - Pattern broadcasts for closed bars
//! - [`Outbox`] - Outbound queue drained by [`run_sender`]
//! - [`run_quotes`], [`run_patterns`], [`run_commands`] - Scheduler loops

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod commands;
mod error;
mod evaluator;
mod handlers;
mod outbox;
mod scanner;
mod scheduler;
mod telegram;

pub use commands::Command;
pub use error::{BotError, ParseError, Result, TransportError};
pub use evaluator::{CRYPTO_MOMENTUM_POINTS, Evaluator, LevelReport, MOMENTUM_POINTS, momentum_points};
pub use handlers::{CommandHandler, FAILURE_TEXT};
pub use outbox::{Notification, Outbox, OutboxReceiver, run_sender};
pub use scanner::{PatternScanner, Timeframe};
pub use scheduler::{SchedulerConfig, run_commands, run_patterns, run_quotes};
pub use telegram::{
    API_URL, Answer, Chat, ChatTransport, KeyboardButton, Message, ReplyKeyboard, TelegramClient,
    TelegramConfig,
};
