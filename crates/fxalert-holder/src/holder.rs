//! The quote holder.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc};
use fxalert_fetch::QuoteFetcher;
use fxalert_types::calendar::{hour_start, previous_trading_day};
use fxalert_types::{Bar, QuoteError, Result, Symbol, SymbolSnapshot};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::bucket::Buckets;
use crate::pool::{FetchJob, FetchResult, JobKind, job_queue, worker};
use crate::{Clock, Shutdown, SystemClock};

/// Tuning knobs for the holder.
#[derive(Debug, Clone)]
pub struct HolderConfig {
    /// Updates requested sooner than this after a completed one are skipped.
    pub min_update_interval: Duration,
    /// Upper bound of the random pause a worker takes between jobs.
    pub max_jitter: Duration,
    /// How long hourly buckets are kept.
    pub hour_retention: TimeDelta,
    /// How long daily buckets are kept.
    pub day_retention: TimeDelta,
}

impl Default for HolderConfig {
    fn default() -> Self {
        Self {
            min_update_interval: Duration::from_secs(60),
            max_jitter: Duration::from_secs(2),
            hour_retention: TimeDelta::hours(24),
            day_retention: TimeDelta::days(7),
        }
    }
}

/// Result of an [`QuoteHolder::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing was fetched (rate limited, or no workers requested).
    Skipped,
    /// Every dispatched job answered.
    Completed {
        /// Results applied to the holder.
        applied: usize,
        /// Jobs that failed and left prior state untouched.
        failed: usize,
    },
    /// Shutdown fired before every job answered; applied results are kept.
    Cancelled {
        /// Results applied before cancellation.
        applied: usize,
    },
}

/// Data guarded by the holder's reader-writer lock.
#[derive(Debug, Default)]
struct Series {
    snapshots: HashMap<Symbol, SymbolSnapshot>,
    hours: Buckets<DateTime<Utc>>,
    days: Buckets<NaiveDate>,
}

/// Bookkeeping owned by whoever is running an update.
#[derive(Debug, Default)]
struct UpdateState {
    last_update: Option<DateTime<Utc>>,
    last_day: Option<NaiveDate>,
}

/// Caches quotes for a fixed symbol universe.
///
/// The holder is the only writer of snapshots and buckets. Every read takes
/// the shared lock and returns a copy, so readers never observe a torn
/// snapshot and never need locks of their own.
#[derive(Debug)]
pub struct QuoteHolder {
    symbols: BTreeSet<Symbol>,
    fetcher: Arc<dyn QuoteFetcher>,
    clock: Arc<dyn Clock>,
    config: HolderConfig,
    series: RwLock<Series>,
    update_state: Mutex<UpdateState>,
}

impl QuoteHolder {
    /// Creates a holder for `symbols` with the default configuration and
    /// the system clock.
    #[must_use]
    pub fn new(symbols: impl IntoIterator<Item = Symbol>, fetcher: Arc<dyn QuoteFetcher>) -> Self {
        Self::with_config(symbols, fetcher, HolderConfig::default(), Arc::new(SystemClock))
    }

    /// Creates a holder with an explicit configuration and clock.
    #[must_use]
    pub fn with_config(
        symbols: impl IntoIterator<Item = Symbol>,
        fetcher: Arc<dyn QuoteFetcher>,
        config: HolderConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
            fetcher,
            clock,
            config,
            series: RwLock::new(Series::default()),
            update_state: Mutex::new(UpdateState::default()),
        }
    }

    /// Returns the symbol universe in alphabetical order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Returns the time of the last completed update.
    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.update_state.lock().await.last_update
    }

    /// Fetches fresh quotes for every symbol using `workers` concurrent
    /// workers.
    ///
    /// Skipped when a completed update ran less than
    /// [`HolderConfig::min_update_interval`] ago; concurrent callers wait for
    /// the running update and then skip. On the first run of a calendar day
    /// the previous trading day of every symbol is fetched as well, to seed
    /// its daily bucket.
    ///
    /// Failed jobs are logged and leave prior state untouched. If `shutdown`
    /// fires mid-flight, results applied so far are kept.
    pub async fn update(&self, workers: usize, shutdown: &Shutdown) -> UpdateOutcome {
        if workers == 0 {
            warn!("update requested with zero workers");
            return UpdateOutcome::Skipped;
        }

        let mut state = self.update_state.lock().await;
        let now = self.clock.now();
        if let Some(last) = state.last_update {
            let elapsed = (now - last).to_std().unwrap_or_default();
            if elapsed < self.config.min_update_interval {
                info!(elapsed_secs = elapsed.as_secs(), "skipping update, last one is too recent");
                return UpdateOutcome::Skipped;
            }
        }

        let today = now.date_naive();
        let rollover = state.last_day != Some(today);
        let jobs = self.plan_jobs(today, rollover);
        info!(jobs = jobs.len(), workers, rollover, "updating quotes");

        let outcome = self.run_jobs(jobs, workers, shutdown).await;
        match outcome {
            UpdateOutcome::Completed { applied, failed } => {
                state.last_update = Some(self.clock.now());
                if rollover {
                    state.last_day = Some(today);
                }
                info!(applied, failed, "quotes updated");
            }
            UpdateOutcome::Cancelled { applied } => {
                info!(applied, "quote update cancelled");
            }
            UpdateOutcome::Skipped => {}
        }
        outcome
    }

    /// Builds one job per symbol for today, plus one per symbol for its
    /// previous trading day when the day rolled over.
    fn plan_jobs(&self, today: NaiveDate, rollover: bool) -> Vec<FetchJob> {
        let current = self.symbols.iter().map(|symbol| FetchJob {
            symbol: symbol.clone(),
            day: today,
            kind: JobKind::Current,
        });
        let mut jobs: Vec<FetchJob> = current.collect();
        if rollover {
            jobs.extend(self.symbols.iter().map(|symbol| FetchJob {
                symbol: symbol.clone(),
                day: previous_trading_day(symbol, today),
                kind: JobKind::PreviousDay,
            }));
        }
        jobs
    }

    /// Fans jobs out to the worker pool and applies results as they arrive.
    async fn run_jobs(
        &self,
        jobs: Vec<FetchJob>,
        workers: usize,
        shutdown: &Shutdown,
    ) -> UpdateOutcome {
        let total = jobs.len();
        if total == 0 {
            return UpdateOutcome::Completed {
                applied: 0,
                failed: 0,
            };
        }

        let queue = job_queue(jobs);
        let (results_tx, mut results_rx) = mpsc::channel::<FetchResult>(workers);
        let mut pool = JoinSet::new();
        for _ in 0..workers.min(total) {
            pool.spawn(worker(
                Arc::clone(&self.fetcher),
                Arc::clone(&queue),
                results_tx.clone(),
                shutdown.clone(),
                self.config.max_jitter,
            ));
        }
        drop(results_tx);

        let mut received = 0;
        let mut applied = 0;
        let mut failed = 0;
        while received < total {
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => None,
                next = results_rx.recv() => next,
            };
            let Some(FetchResult { job, result }) = next else {
                break;
            };
            received += 1;
            match result {
                Ok(bar) => {
                    debug!(symbol = %job.symbol, day = %job.day, %bar, "got quote");
                    self.apply(&job, bar);
                    applied += 1;
                }
                Err(e) => {
                    error!(symbol = %job.symbol, day = %job.day, error = %e, "can't fetch quote");
                    failed += 1;
                }
            }
        }
        pool.abort_all();

        if received < total {
            UpdateOutcome::Cancelled { applied }
        } else {
            UpdateOutcome::Completed { applied, failed }
        }
    }

    /// Applies one successful result under the write lock.
    fn apply(&self, job: &FetchJob, bar: Bar) {
        let now = self.clock.now();
        let mut series = self.write();
        match job.kind {
            JobKind::Current => {
                let close = bar.close;
                match series.snapshots.get_mut(&job.symbol) {
                    Some(snapshot) => snapshot.rotate(bar),
                    None => {
                        series
                            .snapshots
                            .insert(job.symbol.clone(), SymbolSnapshot::first(bar));
                    }
                }
                let hour = hour_start(now);
                let hour_cutoff = self.hour_cutoff(now);
                series.hours.observe(&job.symbol, hour, close, hour_cutoff);
                let day_cutoff = self.day_cutoff(now);
                series.days.observe(&job.symbol, job.day, close, day_cutoff);
            }
            JobKind::PreviousDay => {
                let day_cutoff = self.day_cutoff(now);
                series.days.seed(job.day, bar, day_cutoff);
            }
        }
    }

    /// Oldest hourly bucket still retained at `now`.
    fn hour_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        hour_start(now) - self.config.hour_retention + TimeDelta::hours(1)
    }

    /// Oldest daily bucket still retained at `now`.
    fn day_cutoff(&self, now: DateTime<Utc>) -> NaiveDate {
        (now - self.config.day_retention).date_naive()
    }

    /// Returns the snapshot for `symbol`.
    ///
    /// # Errors
    ///
    /// [`QuoteError::NotAllowed`] if the symbol is outside the universe,
    /// [`QuoteError::NoQuote`] if nothing was fetched for it yet.
    pub fn quote(&self, symbol: &str) -> Result<SymbolSnapshot> {
        let symbol = self.allowed(symbol)?;
        self.read()
            .snapshots
            .get(&symbol)
            .cloned()
            .ok_or_else(|| QuoteError::NoQuote(symbol.to_string()))
    }

    /// Returns the bar from the most recent successful update.
    ///
    /// # Errors
    ///
    /// See [`Self::quote`].
    pub fn current_quote(&self, symbol: &str) -> Result<Bar> {
        self.quote(symbol).map(|s| s.current)
    }

    /// Returns the bar from before the most recent successful update.
    ///
    /// # Errors
    ///
    /// See [`Self::quote`].
    pub fn previous_quote(&self, symbol: &str) -> Result<Bar> {
        self.quote(symbol).map(|s| s.previous)
    }

    /// Returns the hourly bar for the given UTC hour of day (0-23) within
    /// the retention window.
    ///
    /// # Errors
    ///
    /// [`QuoteError::NotAllowed`] if the symbol is outside the universe,
    /// [`QuoteError::NoQuote`] if that bucket was never populated.
    pub fn quote_by_hour(&self, symbol: &str, hour: u32) -> Result<Bar> {
        let symbol = self.allowed(symbol)?;
        let cutoff = self.hour_cutoff(self.clock.now());
        self.read()
            .hours
            .find(&symbol, cutoff, |k| k.hour() == hour)
            .cloned()
            .ok_or_else(|| QuoteError::NoQuote(symbol.to_string()))
    }

    /// Returns the daily bar for the given day of year (1-366) within the
    /// retention window.
    ///
    /// # Errors
    ///
    /// [`QuoteError::NotAllowed`] if the symbol is outside the universe,
    /// [`QuoteError::NoQuote`] if that bucket was never populated.
    pub fn quote_by_day(&self, symbol: &str, day_of_year: u32) -> Result<Bar> {
        let symbol = self.allowed(symbol)?;
        let cutoff = self.day_cutoff(self.clock.now());
        self.read()
            .days
            .find(&symbol, cutoff, |k| k.ordinal() == day_of_year)
            .cloned()
            .ok_or_else(|| QuoteError::NoQuote(symbol.to_string()))
    }

    /// Returns the provider's completed daily bar for `day`.
    ///
    /// Unlike [`Self::quote_by_day`], a bucket that so far only folds the
    /// closes observed during that day is not served; only a bucket seeded
    /// by the previous-trading-day pass counts as closed.
    ///
    /// # Errors
    ///
    /// [`QuoteError::NotAllowed`] if the symbol is outside the universe,
    /// [`QuoteError::NoQuote`] if that day has not been seeded yet or is past
    /// retention.
    pub fn closed_day(&self, symbol: &str, day: NaiveDate) -> Result<Bar> {
        let symbol = self.allowed(symbol)?;
        let cutoff = self.day_cutoff(self.clock.now());
        if day < cutoff {
            return Err(QuoteError::NoQuote(symbol.to_string()));
        }
        self.read()
            .days
            .closed(&symbol, day)
            .cloned()
            .ok_or_else(|| QuoteError::NoQuote(symbol.to_string()))
    }

    fn allowed(&self, raw: &str) -> Result<Symbol> {
        Symbol::new(raw)
            .ok()
            .filter(|s| self.symbols.contains(s))
            .ok_or_else(|| QuoteError::NotAllowed(raw.trim().to_ascii_uppercase()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Series> {
        self.series.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Series> {
        self.series.write().unwrap_or_else(PoisonError::into_inner)
    }
}
