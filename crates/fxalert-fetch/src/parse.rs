//! Decoding of the provider's JSONP envelope.

use fxalert_types::{Bar, Symbol};
use serde::Deserialize;

use crate::FetchError;

/// Envelope returned by the provider.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Status", alias = "status")]
    status: i64,
    #[serde(rename = "OHLC", alias = "ohlc", default)]
    ohlc: Vec<RawOhlc>,
}

/// One raw bar: `s` is the open and `e` the close.
#[derive(Debug, Deserialize)]
struct RawOhlc {
    l: f64,
    h: f64,
    s: f64,
    e: f64,
}

/// Removes a `callback(...);` JSONP wrapper, if present.
#[must_use]
pub fn strip_jsonp<'a>(body: &'a str, callback: &str) -> &'a str {
    let body = body.trim();
    let Some(inner) = body
        .strip_prefix(callback)
        .and_then(|rest| rest.strip_prefix('('))
    else {
        return body;
    };
    inner
        .strip_suffix(");")
        .or_else(|| inner.strip_suffix(')'))
        .unwrap_or(inner)
}

/// Decodes a provider payload into a validated bar.
///
/// # Errors
///
/// Returns an error if the payload is not a valid envelope, the envelope
/// status is not 200, it holds no bars, or the first bar is invalid.
pub fn parse_quote(symbol: &Symbol, payload: &str) -> Result<Bar, FetchError> {
    let envelope: Envelope =
        serde_json::from_str(payload).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if envelope.status != 200 {
        return Err(FetchError::Status {
            status: envelope.status,
        });
    }

    let raw = envelope.ohlc.first().ok_or(FetchError::Empty)?;
    let bar = Bar::new(symbol.clone(), raw.s, raw.h, raw.l, raw.e);
    if !bar.is_valid() {
        return Err(FetchError::InvalidBar(bar.to_string()));
    }

    Ok(bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eurusd() -> Symbol {
        Symbol::new("EURUSD").unwrap()
    }

    #[test]
    fn test_strip_jsonp() {
        assert_eq!(strip_jsonp(" cb({\"a\":1}); ", "cb"), "{\"a\":1}");
        assert_eq!(strip_jsonp("cb({\"a\":1})", "cb"), "{\"a\":1}");
        assert_eq!(strip_jsonp("{\"a\":1}", "cb"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_valid_quote() {
        let payload = r#"{"Status":200,"OHLC":[{"l":1.0801,"h":1.0912,"s":1.0850,"e":1.0900}]}"#;
        let bar = parse_quote(&eurusd(), payload).unwrap();
        assert_eq!(bar.symbol, eurusd());
        assert!((bar.open - 1.0850).abs() < 1e-12);
        assert!((bar.high - 1.0912).abs() < 1e-12);
        assert!((bar.low - 1.0801).abs() < 1e-12);
        assert!((bar.close - 1.0900).abs() < 1e-12);
    }

    #[test]
    fn test_parse_bad_status() {
        let payload = r#"{"Status":500,"OHLC":[]}"#;
        assert!(matches!(
            parse_quote(&eurusd(), payload),
            Err(FetchError::Status { status: 500 })
        ));
    }

    #[test]
    fn test_parse_empty() {
        let payload = r#"{"Status":200,"OHLC":[]}"#;
        assert!(matches!(
            parse_quote(&eurusd(), payload),
            Err(FetchError::Empty)
        ));
        let payload = r#"{"Status":200}"#;
        assert!(matches!(
            parse_quote(&eurusd(), payload),
            Err(FetchError::Empty)
        ));
    }

    #[test]
    fn test_parse_invalid_bar() {
        let payload = r#"{"Status":200,"OHLC":[{"l":0,"h":1.09,"s":1.08,"e":1.09}]}"#;
        assert!(matches!(
            parse_quote(&eurusd(), payload),
            Err(FetchError::InvalidBar(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_quote(&eurusd(), "<html>"),
            Err(FetchError::Malformed(_))
        ));
    }
}
