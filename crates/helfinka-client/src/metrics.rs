//! Client metrics for observability.
//!
//! Metrics are recorded through the `metrics` facade and are no-ops until
//! the application installs a recorder.
//!
//! # Metrics
//!
//! - `helfinka_client_requests_total` - Counter of requests by API, operation, outcome
//! - `helfinka_client_request_duration_seconds` - Histogram of request latencies
//! - `helfinka_client_unauthorized_total` - Counter of 401/403 responses
//! - `helfinka_client_decode_skips_total` - Counter of stored items dropped while decoding

use std::time::Instant;

use metrics::{counter, histogram};

/// Metric name for total requests.
pub const REQUESTS_TOTAL: &str = "helfinka_client_requests_total";

/// Metric name for request duration histogram.
pub const REQUEST_DURATION_SECONDS: &str = "helfinka_client_request_duration_seconds";

/// Metric name for unauthorized responses.
pub const UNAUTHORIZED_TOTAL: &str = "helfinka_client_unauthorized_total";

/// Metric name for skipped stored items.
pub const DECODE_SKIPS_TOTAL: &str = "helfinka_client_decode_skips_total";

/// API groups for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Auth,
    Entries,
    Users,
    Meta,
}

impl Api {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Entries => "entries",
            Self::Users => "users",
            Self::Meta => "meta",
        }
    }
}

/// Request outcome for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
    Unauthorized,
    Timeout,
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Unauthorized => "unauthorized",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Record a request completion.
pub fn record_request(api: Api, operation: &'static str, outcome: Outcome, duration_seconds: f64) {
    counter!(
        REQUESTS_TOTAL,
        "api" => api.as_str(),
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "api" => api.as_str(),
        "operation" => operation
    )
    .record(duration_seconds);

    if outcome == Outcome::Unauthorized {
        counter!(UNAUTHORIZED_TOTAL, "operation" => operation).increment(1);
    }
}

/// Record stored items dropped by the lenient list decoder.
pub fn record_decode_skips(operation: &'static str, skipped: usize) {
    if skipped > 0 {
        counter!(DECODE_SKIPS_TOTAL, "operation" => operation).increment(skipped as u64);
    }
}

/// Timer guard for recording request duration.
///
/// Records the request as cancelled if dropped without an outcome, which
/// happens when the caller drops the request future.
#[must_use]
pub struct RequestTimer {
    api: Api,
    operation: &'static str,
    start: Instant,
    recorded: bool,
}

impl RequestTimer {
    pub fn start(api: Api, operation: &'static str) -> Self {
        Self {
            api,
            operation,
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Record the outcome and return the elapsed time.
    pub fn finish(mut self, outcome: Outcome) -> std::time::Duration {
        let duration = self.start.elapsed();
        record_request(self.api, self.operation, outcome, duration.as_secs_f64());
        self.recorded = true;
        duration
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.recorded {
            let duration = self.start.elapsed();
            record_request(
                self.api,
                self.operation,
                Outcome::Cancelled,
                duration.as_secs_f64(),
            );
        }
    }
}

/// Describe all metrics for registration with a recorder.
pub fn describe_metrics() {
    use metrics::{describe_counter, describe_histogram, Unit};

    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Total number of HTTP requests made by the Helfinka client"
    );

    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of HTTP requests in seconds"
    );

    describe_counter!(
        UNAUTHORIZED_TOTAL,
        Unit::Count,
        "Responses with status 401 or 403, each of which ends the session"
    );

    describe_counter!(
        DECODE_SKIPS_TOTAL,
        Unit::Count,
        "Stored items left out of list results because they failed to decode"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names() {
        assert_eq!(Api::Entries.as_str(), "entries");
        assert_eq!(Api::Meta.as_str(), "meta");
        assert_eq!(Outcome::Unauthorized.as_str(), "unauthorized");
        assert_eq!(Outcome::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_request_timer_finish() {
        let timer = RequestTimer::start(Api::Auth, "login");
        std::thread::sleep(std::time::Duration::from_millis(10));
        let duration = timer.finish(Outcome::Success);

        assert!(duration.as_millis() >= 10);
    }

    #[test]
    fn test_recording_without_recorder_does_not_panic() {
        record_request(Api::Entries, "list_entries", Outcome::Error, 0.2);
        record_request(Api::Entries, "list_entries", Outcome::Unauthorized, 0.1);
        record_decode_skips("list_entries", 3);
        record_decode_skips("list_entries", 0);
        let _timer = RequestTimer::start(Api::Users, "update_profile");
    }

    #[test]
    fn test_describe_metrics_does_not_panic() {
        describe_metrics();
    }
}
