//! Command handling.

use fxalert_holder::QuoteHolder;
use fxalert_store::{AlertStore, UserId, UserSettings};
use fxalert_types::{AlertLevel, QuoteError};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::commands::{Command, filter_matches, help_text};
use crate::{Answer, Message, ReplyKeyboard, Result};

/// Answer sent when a command fails after parsing.
pub const FAILURE_TEXT: &str = "Can't process command";

/// Answers chat commands against the holder and the alert store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    holder: Arc<QuoteHolder>,
    store: Arc<AlertStore>,
}

impl CommandHandler {
    /// Creates a handler.
    #[must_use]
    pub const fn new(holder: Arc<QuoteHolder>, store: Arc<AlertStore>) -> Self {
        Self { holder, store }
    }

    /// Answers one message. Never fails: parse errors get the help text and
    /// handler errors a short failure notice.
    pub fn answer(&self, message: &Message) -> Answer {
        let user = message.chat.id;
        let command = match Command::parse(&message.text) {
            Ok(command) => command,
            Err(e) => {
                info!(user, text = %message.text, error = %e, "can't parse command");
                return Answer::text(help_text());
            }
        };
        match self.handle(user, command) {
            Ok(answer) => answer,
            Err(e) => {
                error!(user, text = %message.text, error = %e, "can't process command");
                Answer::text(FAILURE_TEXT)
            }
        }
    }

    /// Runs a parsed command for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if a symbol is outside the universe or the store
    /// cannot be written.
    pub fn handle(&self, user: UserId, command: Command) -> Result<Answer> {
        match command {
            Command::Add(level) => self.add(user, level),
            Command::DeleteKeyboard => Ok(self.delete_keyboard(user)),
            Command::DeleteMatching(filter) => self.delete_matching(user, &filter),
            Command::Delete(level) => self.delete(user, &level),
            Command::List(filter) => Ok(self.list(user, filter.as_deref())),
            Command::Delta { filter, points } => self.delta(user, filter.as_deref(), points),
            Command::Help => Ok(Answer::text(help_text())),
        }
    }

    fn add(&self, user: UserId, level: AlertLevel) -> Result<Answer> {
        if !self.holder.symbols().any(|s| *s == level.symbol) {
            return Err(QuoteError::NotAllowed(level.symbol.to_string()).into());
        }
        self.store.add(user, [level.clone()])?;
        info!(user, alert = %level, "alert added");

        let mut text = format!("Added: {level}");
        match self.holder.current_quote(level.symbol.as_str()) {
            Ok(bar) => {
                let _ = write!(
                    text,
                    "\nDiff: {}\nCurrent: {}",
                    level.symbol.format_price((bar.close - level.price).abs()),
                    level.symbol.format_price(bar.close)
                );
            }
            Err(e) => warn!(user, symbol = %level.symbol, error = %e, "can't get diff for new alert"),
        }
        Ok(Answer::text(text))
    }

    fn delete_keyboard(&self, user: UserId) -> Answer {
        let levels = self.store.list(user);
        if levels.is_empty() {
            return Answer::text("No alerts");
        }
        let labels = levels.iter().map(|level| format!("/del {level}"));
        Answer::text("Select:").with_keyboard(ReplyKeyboard::one_per_row(labels))
    }

    fn delete_matching(&self, user: UserId, filter: &str) -> Result<Answer> {
        let removed = self
            .store
            .remove_where(user, |level| filter_matches(filter, &level.symbol))?;
        if removed.is_empty() {
            return Ok(Answer::text(format!("No alerts matching {filter}")));
        }
        info!(user, filter, removed = removed.len(), "alerts deleted");
        Ok(Answer::text(lines("Deleted:", removed.iter())))
    }

    fn delete(&self, user: UserId, level: &AlertLevel) -> Result<Answer> {
        if self.store.delete(user, level)? {
            info!(user, alert = %level, "alert deleted");
            Ok(Answer::text(format!("Deleted: {level}")))
        } else {
            Ok(Answer::text(format!("Not found: {level}")))
        }
    }

    fn list(&self, user: UserId, filter: Option<&str>) -> Answer {
        let mut levels: Vec<AlertLevel> = self
            .store
            .list(user)
            .into_iter()
            .filter(|level| filter.is_none_or(|f| filter_matches(f, &level.symbol)))
            .collect();
        if levels.is_empty() {
            return Answer::text("No alerts");
        }
        levels.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let mut text = String::new();
        for level in &levels {
            let current = self
                .holder
                .current_quote(level.symbol.as_str())
                .map_or_else(|_| "-".to_string(), |bar| level.symbol.format_price(bar.close));
            let _ = writeln!(text, "{level} ({current})");
        }
        Answer::text(text)
    }

    fn delta(&self, user: UserId, filter: Option<&str>, points: i64) -> Result<Answer> {
        let symbols: Vec<_> = self
            .holder
            .symbols()
            .filter(|s| filter.is_none_or(|f| filter_matches(f, s)))
            .cloned()
            .collect();
        if symbols.is_empty() {
            return Err(QuoteError::NotAllowed(filter.unwrap_or_default().to_string()).into());
        }

        self.store
            .set_user_settings(user, UserSettings { delta: Some(points) })?;

        let mut levels = Vec::new();
        let mut skipped = Vec::new();
        for symbol in &symbols {
            match self.holder.current_quote(symbol.as_str()) {
                Ok(bar) => levels.extend(AlertLevel::delta_pair(symbol, bar.close, points)),
                Err(e) => {
                    warn!(user, symbol = %symbol, error = %e, "can't add delta pair");
                    skipped.push(symbol);
                }
            }
        }
        if !levels.is_empty() {
            self.store.add(user, levels.clone())?;
        }
        info!(user, points, pairs = levels.len() / 2, "delta pairs added");

        let mut text = lines("Added levels:", levels.iter());
        if !skipped.is_empty() {
            text.push_str(&lines("\nNo quote yet for:", skipped.iter()));
        }
        Ok(Answer::text(text))
    }
}

fn lines<T: std::fmt::Display>(header: &str, items: impl Iterator<Item = T>) -> String {
    let mut text = header.to_string();
    for item in items {
        let _ = write!(text, "\n{item}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chat;
    use crate::commands::ANY_SYMBOL;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use fxalert_fetch::{FetchError, QuoteFetcher};
    use fxalert_holder::{HolderConfig, ManualClock, Shutdown};
    use fxalert_types::{Bar, Direction, Symbol};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct OneFetcher;

    #[async_trait]
    impl QuoteFetcher for OneFetcher {
        async fn fetch(&self, symbol: &Symbol, _day: NaiveDate) -> std::result::Result<Bar, FetchError> {
            match symbol.as_str() {
                "EURUSD" => Ok(Bar::flat(symbol.clone(), 1.1)),
                "USDJPY" => Ok(Bar::flat(symbol.clone(), 150.0)),
                _ => Err(FetchError::Empty),
            }
        }
    }

    async fn handler() -> (TempDir, CommandHandler, Arc<AlertStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(AlertStore::open(dir.path().join("db.json"), true).unwrap());
        let holder = Arc::new(QuoteHolder::with_config(
            ["EURUSD", "USDJPY", "GBPUSD"].map(|s| Symbol::new(s).unwrap()),
            Arc::new(OneFetcher),
            HolderConfig {
                max_jitter: Duration::ZERO,
                ..Default::default()
            },
            Arc::new(ManualClock::new(chrono::Utc::now())),
        ));
        holder.update(2, &Shutdown::never()).await;
        (dir, CommandHandler::new(holder, store.clone()), store)
    }

    fn message(text: &str) -> Message {
        Message {
            message_id: 1,
            text: text.to_string(),
            chat: Chat { id: 42 },
        }
    }

    #[tokio::test]
    async fn test_add_reports_diff() {
        let (_dir, handler, store) = handler().await;

        let answer = handler.answer(&message("/add eurusd > 1.2"));

        assert_eq!(
            answer.text,
            "Added: EURUSD > 1.20000\nDiff: 0.10000\nCurrent: 1.10000"
        );
        assert_eq!(store.list(42).len(), 1);
    }

    #[tokio::test]
    async fn test_add_outside_universe_fails() {
        let (_dir, handler, store) = handler().await;

        let answer = handler.answer(&message("/add xauusd > 2000"));

        assert_eq!(answer.text, FAILURE_TEXT);
        assert!(store.list(42).is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_answers_help() {
        let (_dir, handler, _store) = handler().await;
        assert_eq!(handler.answer(&message("/add eurusd")).text, help_text());
        assert_eq!(handler.answer(&message("/help")).text, help_text());
    }

    #[tokio::test]
    async fn test_delete_keyboard() {
        let (_dir, handler, store) = handler().await;
        assert_eq!(handler.answer(&message("/del")).text, "No alerts");

        handler.answer(&message("/add eurusd < 1.0"));
        let answer = handler.answer(&message("/del"));

        let keyboard = answer.keyboard.unwrap();
        assert!(keyboard.one_time_keyboard);
        let label = &keyboard.keyboard[0][0].text;
        assert_eq!(label, "/del EURUSD < 1.00000");

        handler.answer(&message(label));
        assert!(store.list(42).is_empty());
    }

    #[tokio::test]
    async fn test_delete_forms() {
        let (_dir, handler, store) = handler().await;
        handler.answer(&message("/add eurusd < 1.0"));
        handler.answer(&message("/add usdjpy < 140"));
        handler.answer(&message("/add usdjpy > 160"));

        let answer = handler.answer(&message("/del gbpusd < 1.0"));
        assert_eq!(answer.text, "Not found: GBPUSD < 1.00000");

        let answer = handler.answer(&message("/del jpy"));
        assert!(answer.text.starts_with("Deleted:"));
        assert_eq!(store.list(42).len(), 1);

        let answer = handler.answer(&message(&format!("/del {ANY_SYMBOL}")));
        assert_eq!(answer.text, "Deleted:\nEURUSD < 1.00000");
        assert!(store.list(42).is_empty());
        assert_eq!(handler.answer(&message("/del eur")).text, "No alerts matching EUR");
    }

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let (_dir, handler, _store) = handler().await;
        assert_eq!(handler.answer(&message("/ls")).text, "No alerts");
        handler.answer(&message("/add usdjpy < 140"));
        handler.answer(&message("/add gbpusd > 1.4"));
        handler.answer(&message("/add eurusd > 1.2"));

        let answer = handler.answer(&message("/ls"));
        assert_eq!(
            answer.text,
            "EURUSD > 1.20000 (1.10000)\nGBPUSD > 1.40000 (-)\nUSDJPY < 140.000 (150.000)\n"
        );

        let answer = handler.answer(&message("/ls jpy"));
        assert_eq!(answer.text, "USDJPY < 140.000 (150.000)\n");
    }

    #[tokio::test]
    async fn test_delta_creates_pairs_and_setting() {
        let (_dir, handler, store) = handler().await;

        let answer = handler.answer(&message("/delta 50"));

        assert!(answer.text.starts_with("Added levels:"));
        assert!(answer.text.contains("No quote yet for:\nGBPUSD"));
        assert_eq!(store.user_settings(42).delta, Some(50));
        let levels = store.list(42);
        assert_eq!(levels.len(), 4);
        let jpy: Vec<_> = levels
            .iter()
            .filter(|l| l.symbol.as_str() == "USDJPY")
            .collect();
        assert_eq!(jpy.len(), 2);
        assert_eq!(jpy[0].delta_id, jpy[1].delta_id);
        let up = jpy.iter().find(|l| l.direction == Direction::BelowCurrent).unwrap();
        assert_eq!(up.price_key(), "150.050");
    }

    #[tokio::test]
    async fn test_delta_filter() {
        let (_dir, handler, store) = handler().await;

        handler.answer(&message("/delta eur 20"));
        assert_eq!(store.list(42).len(), 2);

        let answer = handler.answer(&message("/delta xau 20"));
        assert_eq!(answer.text, FAILURE_TEXT);
    }
}
