//! Calendar helpers for keying hourly and daily bars.
//!
//! Hourly bars are keyed by the start of their UTC hour, daily bars by their
//! calendar date. Forex symbols do not trade on weekends, so the "previous
//! day" of a forex symbol is the previous weekday.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc, Weekday};

use crate::Symbol;

/// Truncates a timestamp to the start of its UTC hour.
#[must_use]
pub fn hour_start(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_minute(0))
        .unwrap_or(t)
}

/// Returns the start of the last fully closed UTC hour.
#[must_use]
pub fn previous_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    hour_start(t) - TimeDelta::hours(1)
}

/// Returns the last trading day strictly before `day` for `symbol`.
///
/// Crypto trades every day; forex skips Saturdays and Sundays, so Monday,
/// Sunday and Saturday all map back to Friday.
#[must_use]
pub fn previous_trading_day(symbol: &Symbol, day: NaiveDate) -> NaiveDate {
    let mut prev = day.pred_opt().unwrap_or(day);
    if symbol.is_crypto() {
        return prev;
    }
    while matches!(prev.weekday(), Weekday::Sat | Weekday::Sun) {
        prev = prev.pred_opt().unwrap_or(prev);
    }
    prev
}

/// Returns the zero-based day of year, as used by the price provider.
#[must_use]
pub fn day_index0(day: NaiveDate) -> u32 {
    day.ordinal0()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_hour_start() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 14, 37, 45).unwrap();
        assert_eq!(
            hour_start(t),
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap()
        );
        assert_eq!(
            previous_hour(t),
            Utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_previous_hour_crosses_midnight() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 0, 10, 0).unwrap();
        assert_eq!(previous_hour(t).hour(), 23);
        assert_eq!(previous_hour(t).day(), 4);
    }

    #[test]
    fn test_previous_trading_day_forex() {
        let eurusd = Symbol::new("EURUSD").unwrap();
        // 2024-03-04 is a Monday.
        assert_eq!(previous_trading_day(&eurusd, date(2024, 3, 4)), date(2024, 3, 1));
        assert_eq!(previous_trading_day(&eurusd, date(2024, 3, 3)), date(2024, 3, 1));
        assert_eq!(previous_trading_day(&eurusd, date(2024, 3, 2)), date(2024, 3, 1));
        assert_eq!(previous_trading_day(&eurusd, date(2024, 3, 5)), date(2024, 3, 4));
    }

    #[test]
    fn test_previous_trading_day_crypto() {
        let btc = Symbol::new("BTCUSD").unwrap();
        assert_eq!(previous_trading_day(&btc, date(2024, 3, 4)), date(2024, 3, 3));
        assert_eq!(previous_trading_day(&btc, date(2024, 1, 1)), date(2023, 12, 31));
    }

    #[test]
    fn test_day_index0() {
        assert_eq!(day_index0(date(2024, 1, 1)), 0);
        assert_eq!(day_index0(date(2024, 12, 31)), 365);
    }
}
