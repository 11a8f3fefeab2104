//! Broadcasts candlestick patterns of freshly closed bars.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use fxalert_holder::QuoteHolder;
use fxalert_patterns::classify;
use fxalert_store::AlertStore;
use fxalert_types::calendar::{hour_start, previous_hour, previous_trading_day};
use fxalert_types::{Bar, Symbol};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{Answer, Notification, Outbox};

/// Bar period scanned for patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    /// The last closed UTC hour.
    Hour,
    /// Each symbol's previous trading day.
    Day,
}

impl Timeframe {
    /// Returns the lowercase name used as the message header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which symbols have been classified for the current period.
#[derive(Debug)]
struct Progress<K> {
    period: Option<K>,
    resolved: HashSet<Symbol>,
}

impl<K: PartialEq> Progress<K> {
    fn new() -> Self {
        Self {
            period: None,
            resolved: HashSet::new(),
        }
    }

    fn enter(&mut self, period: K) {
        if self.period.as_ref() != Some(&period) {
            self.period = Some(period);
            self.resolved.clear();
        }
    }
}

/// Classifies each symbol's last closed hour and day once per period.
///
/// A symbol whose bar is not available yet stays pending and is retried on
/// the next scan. A day counts as closed only once the holder has seeded it
/// with the provider's completed bar.
#[derive(Debug)]
pub struct PatternScanner {
    holder: Arc<QuoteHolder>,
    store: Arc<AlertStore>,
    outbox: Outbox,
    hour: Progress<DateTime<Utc>>,
    day: Progress<NaiveDate>,
}

impl PatternScanner {
    /// Creates a scanner with nothing scanned yet.
    #[must_use]
    pub fn new(holder: Arc<QuoteHolder>, store: Arc<AlertStore>, outbox: Outbox) -> Self {
        Self {
            holder,
            store,
            outbox,
            hour: Progress::new(),
            day: Progress::new(),
        }
    }

    /// Scans both timeframes at `now` and broadcasts any patterns found to
    /// every known user.
    ///
    /// Returns the number of notifications queued.
    pub async fn scan(&mut self, now: DateTime<Utc>) -> usize {
        let users = self.store.list_all_user_ids();
        if users.is_empty() {
            return 0;
        }

        let mut queued = 0;
        for timeframe in [Timeframe::Hour, Timeframe::Day] {
            let found = self.scan_timeframe(timeframe, now);
            if found.is_empty() {
                continue;
            }
            let text = format!("{timeframe}\n{}", found.join("\n"));
            info!(%timeframe, patterns = found.len(), users = users.len(), "broadcasting patterns");
            for &user in &users {
                if self
                    .outbox
                    .push(Notification::new(user, Answer::text(text.clone())))
                    .await
                {
                    queued += 1;
                }
            }
        }
        queued
    }

    fn scan_timeframe(&mut self, timeframe: Timeframe, now: DateTime<Utc>) -> Vec<String> {
        let today = now.date_naive();
        let closed_hour = previous_hour(now).hour();
        match timeframe {
            Timeframe::Hour => self.hour.enter(hour_start(now)),
            Timeframe::Day => self.day.enter(today),
        }

        let mut found = Vec::new();
        for symbol in self.holder.symbols() {
            let progress = match timeframe {
                Timeframe::Hour => &mut self.hour.resolved,
                Timeframe::Day => &mut self.day.resolved,
            };
            if progress.contains(symbol) {
                continue;
            }
            let bar = match timeframe {
                Timeframe::Hour => self.holder.quote_by_hour(symbol.as_str(), closed_hour),
                Timeframe::Day => self
                    .holder
                    .closed_day(symbol.as_str(), previous_trading_day(symbol, today)),
            };
            match bar {
                Ok(bar) => {
                    progress.insert(symbol.clone());
                    if let Some(line) = describe(&bar) {
                        found.push(line);
                    }
                }
                Err(e) if e.is_transient() => {
                    debug!(%timeframe, symbol = %symbol, "closed bar not available yet");
                }
                Err(e) => {
                    debug!(%timeframe, symbol = %symbol, error = %e, "skipping symbol");
                    progress.insert(symbol.clone());
                }
            }
        }
        found
    }
}

fn describe(bar: &Bar) -> Option<String> {
    classify(bar).map(|pattern| format!("{} - {pattern}", bar.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use fxalert_fetch::{FetchError, QuoteFetcher};
    use fxalert_holder::{HolderConfig, ManualClock, Shutdown};
    use fxalert_store::UserSettings;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Today's closes come from a queue; earlier days get a star bar.
    #[derive(Debug)]
    struct ShapeFetcher {
        today: NaiveDate,
        closes: Mutex<VecDeque<f64>>,
    }

    #[async_trait]
    impl QuoteFetcher for ShapeFetcher {
        async fn fetch(&self, symbol: &Symbol, day: NaiveDate) -> Result<Bar, FetchError> {
            if day != self.today {
                return Ok(Bar::new(symbol.clone(), 0.4, 1.0, 0.1, 0.5));
            }
            let close = self.closes.lock().unwrap().pop_front().ok_or(FetchError::Empty)?;
            Ok(Bar::flat(symbol.clone(), close))
        }
    }

    struct Fixture {
        _dir: TempDir,
        clock: Arc<ManualClock>,
        holder: Arc<QuoteHolder>,
        store: Arc<AlertStore>,
        scanner: PatternScanner,
        inbox: crate::outbox::OutboxReceiver,
    }

    fn start() -> DateTime<Utc> {
        // A Wednesday.
        Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
    }

    async fn fixture(closes: &[f64]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(AlertStore::open(dir.path().join("db.json"), true).unwrap());
        let clock = Arc::new(ManualClock::new(start()));
        let fetcher = Arc::new(ShapeFetcher {
            today: start().date_naive(),
            closes: Mutex::new(closes.iter().copied().collect()),
        });
        let holder = Arc::new(QuoteHolder::with_config(
            [Symbol::new("EURUSD").unwrap()],
            fetcher,
            HolderConfig {
                max_jitter: Duration::ZERO,
                ..Default::default()
            },
            clock.clone(),
        ));
        for _ in closes {
            holder.update(1, &Shutdown::never()).await;
            clock.advance(TimeDelta::seconds(61));
        }
        let (outbox, inbox) = Outbox::new(16);
        let scanner = PatternScanner::new(holder.clone(), store.clone(), outbox);
        Fixture {
            _dir: dir,
            clock,
            holder,
            store,
            scanner,
            inbox,
        }
    }

    #[tokio::test]
    async fn test_broadcasts_closed_bars_once() {
        let mut fx = fixture(&[0.9, 1.0, 0.1, 0.8]).await;
        fx.store.set_user_settings(1, UserSettings { delta: Some(10) }).unwrap();
        fx.store.set_user_settings(2, UserSettings { delta: Some(10) }).unwrap();
        let now = start() + TimeDelta::hours(1) + TimeDelta::seconds(5);
        fx.clock.set(now);

        assert_eq!(fx.scanner.scan(now).await, 4);
        let mut texts = Vec::new();
        while let Some(n) = fx.inbox.try_recv() {
            texts.push((n.chat_id, n.answer.text));
        }
        assert!(texts.contains(&(1, "hour\nEURUSD - pinbar (bull)".to_string())));
        assert!(texts.contains(&(2, "day\nEURUSD - starbar (neutral)".to_string())));

        assert_eq!(fx.scanner.scan(now + TimeDelta::seconds(10)).await, 0);
    }

    #[tokio::test]
    async fn test_missing_bar_is_retried() {
        let mut fx = fixture(&[]).await;
        fx.store.set_user_settings(1, UserSettings { delta: Some(10) }).unwrap();
        let now = start() + TimeDelta::hours(1);
        fx.clock.set(now);

        assert_eq!(fx.scanner.scan(now).await, 0);

        // The previous-day pass seeds the day bar on the next update.
        fx.holder.update(1, &Shutdown::never()).await;
        assert_eq!(fx.scanner.scan(now).await, 1);
        assert_eq!(
            fx.inbox.try_recv().unwrap().answer.text,
            "day\nEURUSD - starbar (neutral)"
        );
    }

    /// Serves flat intraday bars until the day is closed, then the
    /// provider's completed bar for it.
    #[derive(Debug)]
    struct ClosingFetcher {
        day: NaiveDate,
        day_closed: AtomicBool,
    }

    #[async_trait]
    impl QuoteFetcher for ClosingFetcher {
        async fn fetch(&self, symbol: &Symbol, day: NaiveDate) -> Result<Bar, FetchError> {
            if day == self.day && self.day_closed.load(Ordering::SeqCst) {
                return Ok(Bar::new(symbol.clone(), 0.9, 1.0, 0.1, 0.8));
            }
            Ok(Bar::flat(symbol.clone(), 1.0))
        }
    }

    #[tokio::test]
    async fn test_day_pattern_waits_for_closed_bar_after_midnight() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(AlertStore::open(dir.path().join("db.json"), true).unwrap());
        store.set_user_settings(1, UserSettings { delta: Some(10) }).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 3, 6, 23, 58, 0).unwrap();
        let clock = Arc::new(ManualClock::new(evening));
        let fetcher = Arc::new(ClosingFetcher {
            day: evening.date_naive(),
            day_closed: AtomicBool::new(false),
        });
        let holder = Arc::new(QuoteHolder::with_config(
            [Symbol::new("EURUSD").unwrap()],
            fetcher.clone(),
            HolderConfig {
                max_jitter: Duration::ZERO,
                ..Default::default()
            },
            clock.clone(),
        ));
        holder.update(1, &Shutdown::never()).await;
        let (outbox, mut inbox) = Outbox::new(16);
        let mut scanner = PatternScanner::new(holder.clone(), store, outbox);

        // Wednesday only has folded intraday closes so far.
        let midnight = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 5).unwrap();
        clock.set(midnight);
        assert_eq!(scanner.scan(midnight).await, 0);
        assert!(inbox.try_recv().is_none());

        fetcher.day_closed.store(true, Ordering::SeqCst);
        holder.update(1, &Shutdown::never()).await;

        let later = midnight + TimeDelta::seconds(10);
        assert_eq!(scanner.scan(later).await, 1);
        assert_eq!(
            inbox.try_recv().unwrap().answer.text,
            "day\nEURUSD - pinbar (bull)"
        );
        assert_eq!(scanner.scan(later + TimeDelta::seconds(10)).await, 0);
    }

    #[tokio::test]
    async fn test_no_users_no_scan() {
        let mut fx = fixture(&[0.9, 1.0, 0.1, 0.8]).await;
        let now = start() + TimeDelta::hours(1);
        fx.clock.set(now);

        assert_eq!(fx.scanner.scan(now).await, 0);
        assert!(fx.inbox.try_recv().is_none());
    }

    #[test]
    fn test_timeframe_display() {
        assert_eq!(Timeframe::Hour.to_string(), "hour");
        assert_eq!(Timeframe::Day.to_string(), "day");
    }
}
