//! Retry policy and per-response decisions for GitHub API requests.
//!
//! Each response is turned into an [`ApiDecision`] by [`decide`], a pure
//! function of the status, headers, attempt number, and current time. The
//! client loop in [`super::ApiClient`] executes the decision.
//!
//! # Decision Table
//!
//! | Status | Condition | Decision |
//! |--------|-----------|----------|
//! | 2xx | - | `Accept` |
//! | 404 | - | `NotFound` (no retry) |
//! | 403/429 | `retry-after` > budget | `GiveUp` |
//! | 403/429 | `retry-after` within budget | `Backoff` for retry-after + 1s |
//! | 403/429 | `x-ratelimit-remaining: 0`, reset > budget | `GiveUp` |
//! | 403/429 | `x-ratelimit-remaining: 0`, reset within budget | `Backoff` until reset + 1s |
//! | 403/429 | no rate-limit headers | `Backoff` for 60s x attempt |
//! | other | - | `Backoff` with short exponential delay |

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tracing::{debug, instrument};

use super::rate_limit::{rate_limit_reset_wait, retry_after_wait};

/// Default number of attempts per API request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default longest server-mandated wait the client accepts (60 seconds).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// Margin added on top of server-provided waits.
pub const WAIT_SAFETY_MARGIN: Duration = Duration::from_secs(1);

/// Step of the linear backoff used for throttling without rate-limit headers.
const DEFAULT_THROTTLE_STEP: Duration = Duration::from_secs(60);

/// Base delay of the exponential backoff for transient failures.
const DEFAULT_TRANSIENT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Maximum jitter added to transient delays (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Why the client is waiting before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffCause {
    /// Server sent `retry-after`.
    RetryAfter,
    /// Rate-limit window exhausted; waiting for `x-ratelimit-reset`.
    RateLimitReset,
    /// 403/429 without usable rate-limit headers.
    Throttled,
    /// Server error, unexpected status, or transport failure.
    Transient,
}

impl BackoffCause {
    /// Rate-limit waits apply to every request sharing the API budget.
    #[must_use]
    pub fn is_rate_limit(self) -> bool {
        !matches!(self, Self::Transient)
    }
}

/// Outcome of inspecting one API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiDecision {
    /// Success; decode the body.
    Accept,
    /// Resource does not exist; stop without retrying.
    NotFound,
    /// Server asked for a wait longer than the budget; stop.
    GiveUp {
        /// How long the server asked to wait.
        requested: Duration,
    },
    /// Wait, then try again if attempts remain.
    Backoff {
        /// How long to wait.
        delay: Duration,
        /// Why.
        cause: BackoffCause,
    },
}

/// Retry configuration for API requests.
///
/// # Default Values
///
/// - `max_retries`: 3 attempts in total
/// - `max_wait`: 60 seconds
/// - throttle step: 60 seconds (linear)
/// - transient base delay: 1 second (doubling, plus up to 500ms jitter)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    max_wait: Duration,
    throttle_step: Duration,
    transient_base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_wait: DEFAULT_MAX_WAIT,
            throttle_step: DEFAULT_THROTTLE_STEP,
            transient_base_delay: DEFAULT_TRANSIENT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt count and wait budget.
    ///
    /// `max_retries` is clamped to at least one attempt.
    #[must_use]
    pub fn new(max_retries: u32, max_wait: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            max_wait,
            ..Self::default()
        }
    }

    /// Total attempts per request.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Longest server-mandated wait accepted.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Linear backoff for throttling without rate-limit headers.
    #[must_use]
    pub fn throttle_delay(&self, attempt: u32) -> Duration {
        self.throttle_step * attempt.max(1)
    }

    /// Exponential backoff with jitter for transient failures.
    ///
    /// Formula: `base * 2^(attempt - 1) + jitter`.
    #[must_use]
    pub fn transient_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.transient_base_delay * 2u32.pow(exponent) + jitter()
    }
}

fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    #[allow(clippy::cast_possible_truncation)]
    let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Decides what to do with a response.
///
/// `attempt` is the 1-indexed attempt that produced the response.
#[instrument(skip(policy, status, headers, now), fields(status = status.as_u16()))]
pub fn decide(
    policy: &RetryPolicy,
    status: StatusCode,
    headers: &HeaderMap,
    attempt: u32,
    now: DateTime<Utc>,
) -> ApiDecision {
    if status.is_success() {
        return ApiDecision::Accept;
    }

    match status {
        StatusCode::NOT_FOUND => ApiDecision::NotFound,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            rate_limited_decision(policy, headers, attempt, now)
        }
        _ => ApiDecision::Backoff {
            delay: policy.transient_delay(attempt),
            cause: BackoffCause::Transient,
        },
    }
}

fn rate_limited_decision(
    policy: &RetryPolicy,
    headers: &HeaderMap,
    attempt: u32,
    now: DateTime<Utc>,
) -> ApiDecision {
    if let Some(wait) = retry_after_wait(headers, now) {
        return bounded_wait(policy, wait, BackoffCause::RetryAfter);
    }

    if let Some(wait) = rate_limit_reset_wait(headers, now) {
        return bounded_wait(policy, wait, BackoffCause::RateLimitReset);
    }

    let delay = policy.throttle_delay(attempt);
    debug!(attempt, delay_secs = delay.as_secs(), "throttled without rate-limit headers");
    ApiDecision::Backoff {
        delay,
        cause: BackoffCause::Throttled,
    }
}

fn bounded_wait(policy: &RetryPolicy, wait: Duration, cause: BackoffCause) -> ApiDecision {
    if wait > policy.max_wait {
        debug!(
            wait_secs = wait.as_secs(),
            max_wait_secs = policy.max_wait.as_secs(),
            ?cause,
            "server-mandated wait exceeds budget"
        );
        return ApiDecision::GiveUp { requested: wait };
    }
    ApiDecision::Backoff {
        delay: wait + WAIT_SAFETY_MARGIN,
        cause,
    }
}
