//! Run command implementation.
//!
//! Wires the quote holder, alert store and Telegram transport together and
//! runs every scheduler until Ctrl+C.

use anyhow::{Context, Result, ensure};
use fxalert_bot::{
    ChatTransport, CommandHandler, Evaluator, Outbox, PatternScanner, SchedulerConfig,
    TelegramClient, TelegramConfig, run_commands, run_patterns, run_quotes, run_sender,
};
use fxalert_fetch::QuoteFetcher;
use fxalert_holder::{QuoteHolder, Shutdown};
use fxalert_store::AlertStore;
use fxalert_symbols::SymbolRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::provider_client;

/// Notifications buffered before producers wait.
const OUTBOX_CAPACITY: usize = 256;

/// Concurrent `sendMessage` calls.
const SEND_CONCURRENCY: usize = 8;

/// Options for [`run`].
pub(crate) struct RunOptions {
    pub(crate) db: Option<PathBuf>,
    pub(crate) token: String,
    pub(crate) provider_url: String,
    pub(crate) fetch_timeout: Duration,
    pub(crate) workers: usize,
    pub(crate) level_interval: Duration,
    pub(crate) momentum_interval: Duration,
    pub(crate) pattern_interval: Duration,
    pub(crate) long_poll: Duration,
}

/// Run the bot until interrupted.
pub(crate) async fn run(options: RunOptions) -> Result<()> {
    ensure!(options.workers > 0, "--workers must be at least 1");
    ensure!(!options.token.trim().is_empty(), "BOT_TOKEN is empty");
    for (name, period) in [
        ("--level-interval-secs", options.level_interval),
        ("--momentum-interval-secs", options.momentum_interval),
        ("--pattern-interval-secs", options.pattern_interval),
    ] {
        ensure!(!period.is_zero(), "{name} must be at least 1");
    }

    let db_path = options.db.unwrap_or_else(AlertStore::default_path);
    let store = Arc::new(
        AlertStore::open(&db_path, true)
            .with_context(|| format!("Failed to open alert store {}", db_path.display()))?,
    );

    let fetcher: Arc<dyn QuoteFetcher> =
        Arc::new(provider_client(&options.provider_url, options.fetch_timeout)?);
    let holder = Arc::new(QuoteHolder::new(
        SymbolRegistry::global().all().cloned(),
        fetcher,
    ));

    let telegram = TelegramConfig {
        long_poll: options.long_poll,
        ..Default::default()
    };
    let transport: Arc<dyn ChatTransport> = Arc::new(
        TelegramClient::new(options.token, telegram).context("Failed to build Telegram client")?,
    );

    let config = SchedulerConfig {
        workers: options.workers,
        level_interval: options.level_interval,
        momentum_interval: options.momentum_interval,
        pattern_interval: options.pattern_interval,
        ..Default::default()
    };
    let (outbox, receiver) = Outbox::new(OUTBOX_CAPACITY);
    let (trigger, shutdown) = Shutdown::new();

    let mut tasks = JoinSet::new();
    tasks.spawn(run_sender(
        Arc::clone(&transport),
        receiver,
        SEND_CONCURRENCY,
        shutdown.clone(),
    ));
    tasks.spawn(run_quotes(
        Arc::clone(&holder),
        Evaluator::new(Arc::clone(&holder), Arc::clone(&store), outbox.clone()),
        config.clone(),
        shutdown.clone(),
    ));
    tasks.spawn(run_patterns(
        PatternScanner::new(Arc::clone(&holder), Arc::clone(&store), outbox.clone()),
        config.pattern_interval,
        shutdown.clone(),
    ));
    tasks.spawn(run_commands(
        transport,
        CommandHandler::new(holder, store),
        outbox,
        config,
        shutdown,
    ));
    info!(store = %db_path.display(), workers = options.workers, "bot started");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("stopping");
        }
        Some(joined) = tasks.join_next() => {
            warn!(?joined, "a task stopped unexpectedly, shutting down");
        }
    }
    trigger.trigger();

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "task failed");
        }
    }
    info!("done");
    Ok(())
}
