//! Retry logic for remote fetches.
//!
//! HTTP 500 is the only status treated as transient. Every other error
//! status, and every transport failure, is returned immediately.

use std::thread;
use std::time::Duration;
use tracing::warn;

use crate::http::{HttpFetch, HttpResponse};
use crate::{Error, Result};

/// Default number of attempts per URL.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Bound used by the default backoff.
pub const DEFAULT_BACKOFF_LIMIT: Duration = Duration::from_secs(15);

const TRANSIENT_STATUS: u16 = 500;

/// Delay between attempts.
///
/// Both growing forms use `e^(attempt / 4)` seconds for the zero-based
/// `attempt` that just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `max(e^(attempt / 4), floor)`: every retry waits at least `floor`.
    ///
    /// This is what ensureconda has always shipped. With the 15s default
    /// floor the exponential term never exceeds it within 10 attempts.
    Floor(Duration),
    /// `min(e^(attempt / 4), ceiling)`: starts at one second and grows.
    Ceiling(Duration),
    /// Constant delay.
    Fixed(Duration),
}

impl Backoff {
    /// Delay after the zero-based `attempt` failed.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let growing = Duration::try_from_secs_f64((f64::from(attempt) / 4.0).exp())
            .unwrap_or(Duration::MAX);
        match *self {
            Self::Floor(floor) => growing.max(floor),
            Self::Ceiling(ceiling) => growing.min(ceiling),
            Self::Fixed(delay) => delay,
        }
    }

    /// Parse `floor` or `ceiling` (using [`DEFAULT_BACKOFF_LIMIT`]).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "floor" => Some(Self::Floor(DEFAULT_BACKOFF_LIMIT)),
            "ceiling" => Some(Self::Ceiling(DEFAULT_BACKOFF_LIMIT)),
            _ => None,
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay policy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Floor(DEFAULT_BACKOFF_LIMIT),
        }
    }
}

/// GET `url`, retrying transient server errors.
///
/// # Errors
///
/// - [`Error::Network`] from the transport, immediately.
/// - [`Error::HttpStatus`] for any non-2xx status other than 500, immediately.
/// - [`Error::RetryExhausted`] once every attempt answered 500.
pub fn fetch_with_retry(
    http: &dyn HttpFetch,
    url: &str,
    config: &RetryConfig,
) -> Result<HttpResponse> {
    for attempt in 0..config.max_attempts {
        let response = http.get(url)?;
        if response.is_success() {
            return Ok(response);
        }
        if response.status != TRANSIENT_STATUS {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        if attempt + 1 < config.max_attempts {
            let delay = config.backoff.delay(attempt);
            warn!(
                %url,
                attempt = attempt + 1,
                max_attempts = config.max_attempts,
                "Failed to retrieve, retrying in {:.2} seconds",
                delay.as_secs_f64()
            );
            thread::sleep(delay);
        }
    }

    Err(Error::RetryExhausted {
        url: url.to_string(),
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Answers with a scripted sequence of statuses.
    struct Scripted {
        statuses: RefCell<VecDeque<u16>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: RefCell::new(statuses.iter().copied().collect()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl HttpFetch for Scripted {
        fn get(&self, _url: &str) -> Result<HttpResponse> {
            *self.calls.borrow_mut() += 1;
            let status = self.statuses.borrow_mut().pop_front().unwrap_or(500);
            Ok(HttpResponse::new(status, format!("body-{status}").into_bytes()))
        }
    }

    fn instant(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    #[test]
    fn test_success_first_attempt() {
        let http = Scripted::new(&[200]);
        let response = fetch_with_retry(&http, "https://x", &instant(10)).unwrap();
        assert_eq!(response.body, b"body-200");
        assert_eq!(http.calls(), 1);
    }

    #[test]
    fn test_two_transient_failures_then_success() {
        let http = Scripted::new(&[500, 500, 200]);
        let response = fetch_with_retry(&http, "https://x", &instant(10)).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(http.calls(), 3);
    }

    #[test]
    fn test_permanent_status_is_not_retried() {
        for status in [400, 403, 404, 503] {
            let http = Scripted::new(&[status, 200]);
            let err = fetch_with_retry(&http, "https://x", &instant(10)).unwrap_err();
            assert!(matches!(err, Error::HttpStatus { status: s, .. } if s == status));
            assert_eq!(http.calls(), 1);
        }
    }

    #[test]
    fn test_exhaustion() {
        let http = Scripted::new(&[]);
        let err = fetch_with_retry(&http, "https://x", &instant(4)).unwrap_err();
        assert!(matches!(err, Error::RetryExhausted { attempts: 4, .. }));
        assert_eq!(http.calls(), 4);
    }

    #[test]
    fn test_transport_error_propagates() {
        struct Unreachable;
        impl HttpFetch for Unreachable {
            fn get(&self, url: &str) -> Result<HttpResponse> {
                Err(Error::network(url, "connection refused"))
            }
        }
        let err = fetch_with_retry(&Unreachable, "https://x", &instant(10)).unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
    }

    #[test]
    fn test_floor_backoff_never_below_floor() {
        let backoff = Backoff::Floor(Duration::from_secs(15));
        for attempt in 0..10 {
            assert_eq!(backoff.delay(attempt), Duration::from_secs(15));
        }
        // e^(12/4) ~ 20s exceeds the floor
        assert!(backoff.delay(12) > Duration::from_secs(20));
    }

    #[test]
    fn test_ceiling_backoff_grows_then_caps() {
        let backoff = Backoff::Ceiling(Duration::from_secs(15));
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert!(backoff.delay(4) > backoff.delay(3));
        assert_eq!(backoff.delay(20), Duration::from_secs(15));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(15));
    }

    #[test]
    fn test_backoff_parse() {
        assert_eq!(
            Backoff::parse("floor"),
            Some(Backoff::Floor(DEFAULT_BACKOFF_LIMIT))
        );
        assert_eq!(
            Backoff::parse("CEILING"),
            Some(Backoff::Ceiling(DEFAULT_BACKOFF_LIMIT))
        );
        assert_eq!(Backoff::parse("linear"), None);
    }
}
