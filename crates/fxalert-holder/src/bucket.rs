//! Hourly and daily aggregation buckets.

use std::collections::{BTreeMap, HashMap};

use fxalert_types::{Bar, Symbol};

/// Aggregated bars per symbol, ordered by bucket key.
///
/// `K` is the start of the bucket's period: a truncated UTC hour for hourly
/// bars, a calendar date for daily bars.
#[derive(Debug)]
pub(crate) struct Buckets<K> {
    series: HashMap<Symbol, BTreeMap<K, Slot>>,
}

#[derive(Debug)]
struct Slot {
    bar: Bar,
    /// Set once the provider's completed bar replaced the folded closes.
    closed: bool,
}

impl<K> Default for Buckets<K> {
    fn default() -> Self {
        Self {
            series: HashMap::new(),
        }
    }
}

impl<K: Ord + Copy> Buckets<K> {
    /// Folds an observed close into the bucket at `key`.
    ///
    /// Opening a bucket evicts every bucket of the symbol older than
    /// `retain_from`.
    pub(crate) fn observe(&mut self, symbol: &Symbol, key: K, close: f64, retain_from: K) {
        let series = self.series.entry(symbol.clone()).or_default();
        match series.get_mut(&key) {
            Some(slot) if slot.closed => {}
            Some(slot) => slot.bar.observe_close(close),
            None => {
                let bar = Bar::flat(symbol.clone(), close);
                series.insert(key, Slot { bar, closed: false });
                series.retain(|k, _| *k >= retain_from);
            }
        }
    }

    /// Replaces the bucket at `key` with a completed bar and closes it.
    pub(crate) fn seed(&mut self, key: K, bar: Bar, retain_from: K) {
        let series = self.series.entry(bar.symbol.clone()).or_default();
        series.insert(key, Slot { bar, closed: true });
        series.retain(|k, _| *k >= retain_from);
    }

    /// Returns the newest bucket not older than `retain_from` whose key
    /// satisfies `matches`.
    pub(crate) fn find(
        &self,
        symbol: &Symbol,
        retain_from: K,
        matches: impl Fn(&K) -> bool,
    ) -> Option<&Bar> {
        self.series
            .get(symbol)?
            .range(retain_from..)
            .rev()
            .find(|(k, _)| matches(k))
            .map(|(_, slot)| &slot.bar)
    }

    /// Returns the bucket at `key` only if it was closed by [`Self::seed`].
    pub(crate) fn closed(&self, symbol: &Symbol, key: K) -> Option<&Bar> {
        self.series
            .get(symbol)?
            .get(&key)
            .filter(|slot| slot.closed)
            .map(|slot| &slot.bar)
    }

    /// Returns the number of buckets held for `symbol`.
    #[cfg(test)]
    pub(crate) fn len(&self, symbol: &Symbol) -> usize {
        self.series.get(symbol).map_or(0, BTreeMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eurusd() -> Symbol {
        Symbol::new("EURUSD").unwrap()
    }

    #[test]
    fn test_observe_same_bucket() {
        let mut buckets = Buckets::<u32>::default();
        for close in [1.10, 1.12, 1.08] {
            buckets.observe(&eurusd(), 5, close, 0);
        }

        let bar = buckets.find(&eurusd(), 0, |k| *k == 5).unwrap();
        assert_relative_eq!(bar.open, 1.10);
        assert_relative_eq!(bar.high, 1.12);
        assert_relative_eq!(bar.low, 1.08);
        assert_relative_eq!(bar.close, 1.08);
    }

    #[test]
    fn test_new_period_opens_new_bucket() {
        let mut buckets = Buckets::<u32>::default();
        buckets.observe(&eurusd(), 5, 1.10, 0);
        buckets.observe(&eurusd(), 6, 1.20, 0);

        assert_eq!(buckets.len(&eurusd()), 2);
        let bar = buckets.find(&eurusd(), 0, |k| *k == 6).unwrap();
        assert_relative_eq!(bar.open, 1.20);
    }

    #[test]
    fn test_retention_on_open() {
        let mut buckets = Buckets::<u32>::default();
        buckets.observe(&eurusd(), 1, 1.0, 0);
        buckets.observe(&eurusd(), 2, 1.0, 0);
        buckets.observe(&eurusd(), 10, 1.0, 5);

        assert_eq!(buckets.len(&eurusd()), 1);
        assert!(buckets.find(&eurusd(), 0, |k| *k == 1).is_none());
    }

    #[test]
    fn test_find_ignores_stale_buckets() {
        let mut buckets = Buckets::<u32>::default();
        buckets.observe(&eurusd(), 3, 1.0, 0);
        assert!(buckets.find(&eurusd(), 4, |_| true).is_none());
        assert!(buckets.find(&eurusd(), 3, |_| true).is_some());
    }

    #[test]
    fn test_seed_replaces_bucket() {
        let mut buckets = Buckets::<u32>::default();
        buckets.observe(&eurusd(), 7, 1.0, 0);
        buckets.seed(7, Bar::new(eurusd(), 1.0, 1.5, 0.9, 1.2), 0);

        let bar = buckets.find(&eurusd(), 0, |k| *k == 7).unwrap();
        assert_relative_eq!(bar.high, 1.5);
        assert_relative_eq!(bar.low, 0.9);
    }

    #[test]
    fn test_only_seeded_buckets_are_closed() {
        let mut buckets = Buckets::<u32>::default();
        buckets.observe(&eurusd(), 7, 1.0, 0);
        assert!(buckets.closed(&eurusd(), 7).is_none());

        buckets.seed(7, Bar::new(eurusd(), 1.0, 1.5, 0.9, 1.2), 0);
        buckets.observe(&eurusd(), 7, 2.0, 0);

        let bar = buckets.closed(&eurusd(), 7).unwrap();
        assert_relative_eq!(bar.high, 1.5);
        assert_relative_eq!(bar.close, 1.2);
    }
}
