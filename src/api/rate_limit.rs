//! Rate-limit header parsing, the shared API rate-limit window, and request pacing.
//!
//! GitHub signals throttling with `retry-after` or with the
//! `x-ratelimit-remaining`/`x-ratelimit-reset` pair. Once a wait is taken, the
//! [`RateLimitGate`] makes every request sharing the client wait out the same
//! window. [`Pacer`] spaces out dependency probes in batch runs.

use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, instrument};

use crate::clock::Clock;

const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Parses a Retry-After header value into a Duration.
///
/// Supports the two RFC 7231 formats:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2025 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Dates in the past yield zero.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
/// use depcite_core::api::parse_retry_after;
///
/// let now = SystemTime::now();
/// assert_eq!(parse_retry_after("120", now), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("invalid", now), None);
/// ```
#[must_use]
#[instrument(skip(now))]
pub fn parse_retry_after(header_value: &str, now: SystemTime) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        return Some(Duration::from_secs(seconds as u64));
    }

    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        Some(datetime.duration_since(now).unwrap_or(Duration::ZERO))
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}

/// Wait requested by a `retry-after` header, if present and parseable.
pub(crate) fn retry_after_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, SystemTime::from(now))
}

/// Wait until `x-ratelimit-reset` when `x-ratelimit-remaining` reads zero.
///
/// A reset time already in the past yields zero.
pub(crate) fn rate_limit_reset_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let remaining = header_i64(headers, RATELIMIT_REMAINING)?;
    if remaining != 0 {
        return None;
    }
    let reset_epoch = header_i64(headers, RATELIMIT_RESET)?;
    let wait_secs = reset_epoch.saturating_sub(now.timestamp()).max(0);
    #[allow(clippy::cast_sign_loss)]
    Some(Duration::from_secs(wait_secs as u64))
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn saturating_add(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Shared "blocked until" instant for one API budget.
///
/// Safe to share between concurrently polled requests; the lock is never held
/// across an await.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    blocked_until: Mutex<Option<DateTime<Utc>>>,
}

impl RateLimitGate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks the gate until `now + delay`; an existing longer block is kept.
    pub fn hold_for(&self, now: DateTime<Utc>, delay: Duration) {
        let until = saturating_add(now, delay);
        if let Ok(mut guard) = self.blocked_until.lock() {
            match *guard {
                Some(existing) if existing >= until => {}
                _ => *guard = Some(until),
            }
        }
    }

    /// Time left before the gate opens, or `None` if it is open.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let until = self.blocked_until.lock().ok().and_then(|guard| *guard)?;
        (until - now).to_std().ok().filter(|d| !d.is_zero())
    }

    /// Waits until the gate is open.
    pub async fn wait_turn(&self, clock: &dyn Clock) {
        if let Some(wait) = self.remaining(clock.now()) {
            debug!(wait_ms = wait.as_millis(), "waiting out shared rate-limit window");
            clock.sleep(wait).await;
        }
    }
}

/// Enforces a minimum spacing between successive acquisitions.
///
/// The first acquisition proceeds immediately. Concurrent callers reserve
/// consecutive slots, so N callers started together finish waiting at
/// 0, interval, 2 x interval, ...
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_slot: Mutex<Option<DateTime<Utc>>>,
}

impl Pacer {
    /// Creates a pacer with the given spacing; zero disables pacing.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Returns the configured spacing.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the next free slot.
    pub async fn acquire(&self, clock: &dyn Clock) {
        if self.interval.is_zero() {
            return;
        }

        let now = clock.now();
        let wait = match self.next_slot.lock() {
            Ok(mut guard) => {
                let slot = match *guard {
                    Some(next) if next > now => next,
                    _ => now,
                };
                *guard = Some(saturating_add(slot, self.interval));
                (slot - now).to_std().unwrap_or(Duration::ZERO)
            }
            Err(_) => Duration::ZERO,
        };

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis(), "pacing request");
            clock.sleep(wait).await;
        }
    }
}
