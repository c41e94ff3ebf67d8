use std::time::{Duration, SystemTime};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TRANSIENT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    RateLimited(Option<Duration>),
    TransientError(StatusCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            transient_delay: DEFAULT_TRANSIENT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, transient_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            transient_delay,
        }
    }

    pub fn delay_for(&self, outcome: &Outcome) -> Duration {
        match outcome {
            Outcome::Success => Duration::ZERO,
            Outcome::RateLimited(retry_after) => retry_after.unwrap_or(Duration::ZERO),
            Outcome::TransientError(_) => self.transient_delay,
        }
    }
}

pub fn classify(status: StatusCode, headers: &HeaderMap) -> Outcome {
    if status == StatusCode::OK || status == StatusCode::CREATED {
        Outcome::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Outcome::RateLimited(parse_retry_after(headers, SystemTime::now()))
    } else {
        Outcome::TransientError(status)
    }
}

pub fn parse_retry_after(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(now).unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with_retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn ok_and_created_are_success() {
        let headers = HeaderMap::new();
        assert_eq!(classify(StatusCode::OK, &headers), Outcome::Success);
        assert_eq!(classify(StatusCode::CREATED, &headers), Outcome::Success);
    }

    #[test]
    fn too_many_requests_carries_retry_after() {
        let headers = headers_with_retry_after("7");
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, &headers),
            Outcome::RateLimited(Some(Duration::from_secs(7)))
        );
    }

    #[test]
    fn too_many_requests_without_header_has_no_delay() {
        let outcome = classify(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new());
        assert_eq!(outcome, Outcome::RateLimited(None));
        assert_eq!(RetryPolicy::default().delay_for(&outcome), Duration::ZERO);
    }

    #[test]
    fn other_statuses_are_transient() {
        let headers = HeaderMap::new();
        for status in [
            StatusCode::NO_CONTENT,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            assert_eq!(classify(status, &headers), Outcome::TransientError(status));
        }
    }

    #[test]
    fn transient_delay_is_fixed() {
        let policy = RetryPolicy::default();
        let outcome = Outcome::TransientError(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(policy.delay_for(&outcome), Duration::from_secs(1));
        assert_eq!(policy.delay_for(&outcome), Duration::from_secs(1));
    }

    #[test]
    fn retry_after_accepts_http_date() {
        let now = httpdate::parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        let headers = headers_with_retry_after("Sun, 06 Nov 1994 08:49:47 GMT");
        assert_eq!(
            parse_retry_after(&headers, now),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn retry_after_in_the_past_is_zero() {
        let now = httpdate::parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        let headers = headers_with_retry_after("Sun, 06 Nov 1994 08:00:00 GMT");
        assert_eq!(parse_retry_after(&headers, now), Some(Duration::ZERO));
    }

    #[test]
    fn malformed_retry_after_is_ignored() {
        let headers = headers_with_retry_after("soon");
        assert_eq!(parse_retry_after(&headers, SystemTime::now()), None);
    }

    #[test]
    fn policy_requires_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
