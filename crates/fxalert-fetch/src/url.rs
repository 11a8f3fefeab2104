//! Provider URL construction.

use chrono::{Datelike, NaiveDate};
use fxalert_types::{Symbol, calendar::day_index0};

/// Base URL for the provider's daily bars.
pub const BASE_URL: &str = "https://price.roboforex.com/prime";

/// Builds the URL for a symbol's daily bar.
///
/// URL format: `{base}/{YEAR}/{SYMBOL}/D1/b?jsonp={callback}&from={DAY}&to={DAY}`
///
/// Note: the provider uses a zero-based day of year (January 1st = 0).
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use fxalert_fetch::url::{BASE_URL, quote_url};
/// use fxalert_types::Symbol;
///
/// let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
/// let url = quote_url(BASE_URL, &Symbol::new("eurusd").unwrap(), day, "jsonp1");
/// assert_eq!(
///     url,
///     "https://price.roboforex.com/prime/2024/EURUSD/D1/b?jsonp=jsonp1&from=31&to=31"
/// );
/// ```
#[must_use]
pub fn quote_url(base: &str, symbol: &Symbol, day: NaiveDate, callback: &str) -> String {
    let index = day_index0(day);
    format!(
        "{}/{}/{}/D1/b?jsonp={}&from={}&to={}",
        base.trim_end_matches('/'),
        day.year(),
        symbol,
        callback,
        index,
        index
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_url_first_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let url = quote_url(BASE_URL, &Symbol::new("GBPUSD").unwrap(), day, "cb");
        assert_eq!(
            url,
            "https://price.roboforex.com/prime/2024/GBPUSD/D1/b?jsonp=cb&from=0&to=0"
        );
    }

    #[test]
    fn test_quote_url_trailing_slash() {
        let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let url = quote_url("http://localhost:8080/", &Symbol::new("btcusd").unwrap(), day, "cb");
        assert_eq!(
            url,
            "http://localhost:8080/2023/BTCUSD/D1/b?jsonp=cb&from=364&to=364"
        );
    }
}
