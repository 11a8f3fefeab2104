//! Level and momentum alert passes.

use fxalert_holder::{QuoteHolder, Shutdown};
use fxalert_store::{AlertStore, UserId};
use fxalert_types::{AlertLevel, DeltaId, Symbol, SymbolSnapshot};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{Answer, Notification, Outbox};

/// Momentum threshold in points for forex symbols.
pub const MOMENTUM_POINTS: i64 = 50;

/// Momentum threshold for crypto symbols, in whole price units.
pub const CRYPTO_MOMENTUM_POINTS: i64 = 500;

/// Counters from one level pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelReport {
    /// Alerts that fired.
    pub fired: usize,
    /// Delta pairs stored after a correlated alert fired.
    pub regenerated: usize,
}

/// Compares stored alerts against the holder and queues notifications.
#[derive(Debug, Clone)]
pub struct Evaluator {
    holder: Arc<QuoteHolder>,
    store: Arc<AlertStore>,
    outbox: Outbox,
}

impl Evaluator {
    /// Creates an evaluator.
    #[must_use]
    pub const fn new(holder: Arc<QuoteHolder>, store: Arc<AlertStore>, outbox: Outbox) -> Self {
        Self {
            holder,
            store,
            outbox,
        }
    }

    /// Fires every stored level the current close has crossed.
    ///
    /// A fired level is deleted. If it belongs to a delta pair, the whole
    /// pair is deleted and, when the user has a delta setting, one fresh pair
    /// is stored around the current close. Each pair is handled once per
    /// pass even if both of its levels crossed.
    pub async fn check_levels(&self, shutdown: &Shutdown) -> LevelReport {
        let mut report = LevelReport::default();
        for user in self.store.list_all_user_ids() {
            if shutdown.is_triggered() {
                return report;
            }
            let mut handled: HashSet<DeltaId> = HashSet::new();
            for level in self.store.list(user) {
                if shutdown.is_triggered() {
                    return report;
                }
                let close = match self.holder.current_quote(level.symbol.as_str()) {
                    Ok(bar) => bar.close,
                    Err(e) => {
                        warn!(user, symbol = %level.symbol, error = %e, "can't get quote to check level");
                        continue;
                    }
                };
                if !level.is_alert(close) {
                    continue;
                }
                if level.delta_id.is_some_and(|id| !handled.insert(id)) {
                    continue;
                }

                let text = format!(
                    "Alert: {level}. \tCurrent: {}",
                    level.symbol.format_price(close)
                );
                self.outbox.push(Notification::new(user, Answer::text(text))).await;
                info!(user, alert = %level, close, "level alert fired");
                report.fired += 1;

                if self.retire(user, &level, close) {
                    report.regenerated += 1;
                }
            }
        }
        report
    }

    /// Deletes a fired level and regenerates its delta pair if configured.
    ///
    /// Returns true if a new pair was stored.
    fn retire(&self, user: UserId, level: &AlertLevel, close: f64) -> bool {
        let Some(delta_id) = level.delta_id else {
            if let Err(e) = self.store.delete(user, level) {
                error!(user, alert = %level, error = %e, "can't delete fired alert");
            }
            return false;
        };

        if let Err(e) = self.store.delete_correlated(user, delta_id) {
            error!(user, alert = %level, error = %e, "can't delete fired delta pair");
        }
        let Some(points) = self.store.user_settings(user).delta else {
            return false;
        };
        let pair = AlertLevel::delta_pair(&level.symbol, close, points);
        match self.store.add(user, pair) {
            Ok(_) => {
                debug!(user, symbol = %level.symbol, points, "regenerated delta pair");
                true
            }
            Err(e) => {
                error!(user, symbol = %level.symbol, error = %e, "can't add delta pair");
                false
            }
        }
    }

    /// Notifies every user with alerts about symbols that moved at least the
    /// momentum threshold between the two latest updates.
    ///
    /// Returns the number of notifications queued. Stored alerts are not
    /// touched.
    pub async fn check_momentum(&self, shutdown: &Shutdown) -> usize {
        let moves: Vec<(Symbol, i64, SymbolSnapshot)> = self
            .holder
            .symbols()
            .filter_map(|symbol| match self.holder.quote(symbol.as_str()) {
                Ok(snapshot) => Some((symbol.clone(), snapshot)),
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "can't get quote to check momentum");
                    None
                }
            })
            .filter_map(|(symbol, snapshot)| {
                let points = momentum_points(&symbol, &snapshot)?;
                Some((symbol, points, snapshot))
            })
            .collect();
        if moves.is_empty() {
            return 0;
        }

        let mut queued = 0;
        for user in self.store.list_all_user_ids() {
            if self.store.list(user).is_empty() {
                continue;
            }
            for (symbol, points, snapshot) in &moves {
                if shutdown.is_triggered() {
                    return queued;
                }
                let text = format!(
                    "Diff: {symbol} - {points} ({})\tPrevious: {}\tCurrent: {}",
                    symbol.format_price(snapshot.close_diff()),
                    symbol.format_price(snapshot.previous.close),
                    symbol.format_price(snapshot.current.close),
                );
                if self.outbox.push(Notification::new(user, Answer::text(text))).await {
                    queued += 1;
                }
            }
        }
        info!(symbols = moves.len(), queued, "momentum alerts queued");
        queued
    }
}

/// Returns the absolute move in points if it reaches the symbol's momentum
/// threshold.
#[must_use]
pub fn momentum_points(symbol: &Symbol, snapshot: &SymbolSnapshot) -> Option<i64> {
    let points = symbol.to_points(snapshot.close_diff().abs());
    let threshold = if symbol.is_crypto() {
        CRYPTO_MOMENTUM_POINTS
    } else {
        MOMENTUM_POINTS
    };
    (points >= threshold).then_some(points)
}
