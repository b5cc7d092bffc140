// ABOUTME: Backoff policy for retrying transient upstream failures
// ABOUTME: Exponential delay by default, overridden by a server-supplied RetryInfo hint

use crate::deadline::Deadline;
use crate::errors::Result;
use log::info;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Base delay for attempt 0; doubles with every attempt.
pub const BASE_DELAY: Duration = Duration::from_millis(800);

/// A retryDelay value: a numeral with an optional unit, e.g. "23s", "1.5s", "500ms".
static RETRY_DELAY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(ms|s|m)?").expect("static regex"));

/// Default exponential delay: `0.8s * 2^attempt`.
pub fn backoff(attempt: u32) -> Duration {
    BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt))
}

/// Extract a server-directed delay from a Google-style error body, if there is one.
pub fn parse_retry_delay(body: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let details = parsed.get("error")?.get("details")?.as_array()?;
    let raw = details
        .iter()
        .find(|d| {
            d.get("@type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.contains("RetryInfo"))
        })?
        .get("retryDelay")?;

    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let caps = RETRY_DELAY_REGEX.captures(&text)?;
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds = match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => amount / 1000.0,
        Some("m") => amount * 60.0,
        _ => amount,
    };
    Duration::try_from_secs_f64(seconds).ok()
}

/// Delay before the attempt following `attempt`, given the failing response body.
pub fn retry_delay(attempt: u32, body: &str) -> Duration {
    parse_retry_delay(body).unwrap_or_else(|| backoff(attempt))
}

/// Suspend for `delay`, giving up early if the deadline fires.
pub async fn wait(delay: Duration, deadline: &Deadline) -> Result<()> {
    info!("Backing off for {:?} before next attempt", delay);
    deadline.sleep(delay).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_default() {
        assert_eq!(backoff(0), Duration::from_millis(800));
        assert_eq!(backoff(1), Duration::from_millis(1600));
        assert_eq!(backoff(2), Duration::from_millis(3200));
        assert!(backoff(1) <= backoff(2));
    }

    #[test]
    fn test_retry_info_hint() {
        let body = r#"{"error":{"code":429,"details":[
            {"@type":"type.googleapis.com/google.rpc.QuotaFailure"},
            {"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"23s"}
        ]}}"#;
        assert_eq!(parse_retry_delay(body), Some(Duration::from_secs(23)));
        assert_eq!(retry_delay(0, body), Duration::from_secs(23));
    }

    #[test]
    fn test_retry_info_units() {
        let wrap = |d: &str| {
            format!(r#"{{"error":{{"details":[{{"@type":"RetryInfo","retryDelay":"{d}"}}]}}}}"#)
        };
        assert_eq!(parse_retry_delay(&wrap("1.5s")), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_delay(&wrap("250ms")), Some(Duration::from_millis(250)));
        assert_eq!(parse_retry_delay(&wrap("2m")), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_delay(&wrap("soon")), None);
    }

    #[test]
    fn test_non_json_body_falls_back() {
        assert_eq!(parse_retry_delay("Service Unavailable"), None);
        assert_eq!(retry_delay(1, "Service Unavailable"), Duration::from_millis(1600));
        assert_eq!(retry_delay(0, r#"{"error":{"details":[]}}"#), backoff(0));
    }
}
