//! Long-running loops that drive the bot until shutdown.

use chrono::Utc;
use fxalert_holder::{QuoteHolder, Shutdown};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

use crate::{ChatTransport, CommandHandler, Evaluator, Notification, Outbox, PatternScanner};

/// Timer configuration for the schedulers.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fetch workers per quote update.
    pub workers: usize,
    /// Period of the level alert pass.
    pub level_interval: Duration,
    /// Period of the momentum pass.
    pub momentum_interval: Duration,
    /// Period of the pattern scan.
    pub pattern_interval: Duration,
    /// Pause after a failed poll.
    pub poll_retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            level_interval: Duration::from_secs(65),
            momentum_interval: Duration::from_secs(5 * 60),
            pattern_interval: Duration::from_secs(10),
            poll_retry_delay: Duration::from_secs(1),
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Updates quotes once, then runs the level and momentum passes on their
/// own timers, each preceded by an update.
pub async fn run_quotes(
    holder: Arc<QuoteHolder>,
    evaluator: Evaluator,
    config: SchedulerConfig,
    shutdown: Shutdown,
) {
    info!(
        level_secs = config.level_interval.as_secs(),
        momentum_secs = config.momentum_interval.as_secs(),
        workers = config.workers,
        "quotes scheduler started"
    );
    holder.update(config.workers, &shutdown).await;

    let mut level = ticker(config.level_interval);
    let mut momentum = ticker(config.momentum_interval);
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            _ = level.tick() => {
                holder.update(config.workers, &shutdown).await;
                let report = evaluator.check_levels(&shutdown).await;
                debug!(fired = report.fired, regenerated = report.regenerated, "level pass done");
            }
            _ = momentum.tick() => {
                holder.update(config.workers, &shutdown).await;
                let queued = evaluator.check_momentum(&shutdown).await;
                debug!(queued, "momentum pass done");
            }
        }
    }
    info!("quotes scheduler stopped");
}

/// Scans for patterns every `period`.
pub async fn run_patterns(mut scanner: PatternScanner, period: Duration, shutdown: Shutdown) {
    info!(period_secs = period.as_secs(), "pattern scheduler started");
    let mut tick = ticker(period);
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            _ = tick.tick() => {
                scanner.scan(Utc::now()).await;
            }
        }
    }
    info!("pattern scheduler stopped");
}

/// Long-polls for chat messages and queues an answer to each one.
pub async fn run_commands(
    transport: Arc<dyn ChatTransport>,
    handler: CommandHandler,
    outbox: Outbox,
    config: SchedulerConfig,
    shutdown: Shutdown,
) {
    info!("command loop started");
    loop {
        let polled = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            polled = transport.poll_messages() => polled,
        };
        match polled {
            Ok(messages) => {
                for message in messages {
                    debug!(chat_id = message.chat.id, text = %message.text, "got message");
                    let answer = handler.answer(&message);
                    outbox
                        .push(Notification::reply(message.chat.id, message.message_id, answer))
                        .await;
                }
            }
            Err(e) => {
                error!(error = %e, "can't get updates");
                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break,
                    () = tokio::time::sleep(config.poll_retry_delay) => {}
                }
            }
        }
    }
    info!("command loop stopped");
}
