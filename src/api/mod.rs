//! GitHub REST API access with retry and rate-limit handling.
//!
//! [`ApiClient::query_api`] fetches one JSON document. Failures never surface
//! as errors: a missing resource, an over-budget wait, or an exhausted retry
//! budget all yield `None`, and the caller treats the data as unavailable.
//!
//! # Retry Loop
//!
//! 1. Wait for the shared [`RateLimitGate`] to open.
//! 2. Send the request with GitHub headers and optional bearer token.
//! 3. Run [`decide`] on the response and act on the [`ApiDecision`].
//!
//! Rate-limit waits are recorded in the gate so concurrent requests on the same
//! client back off together. No wait is taken after the final attempt.

mod rate_limit;
mod retry;

pub use rate_limit::{Pacer, RateLimitGate, parse_retry_after};
pub use retry::{
    ApiDecision, BackoffCause, DEFAULT_MAX_RETRIES, DEFAULT_MAX_WAIT, RetryPolicy,
    WAIT_SAFETY_MARGIN, decide,
};

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Authenticated, retrying JSON client for the GitHub API.
pub struct ApiClient {
    client: Client,
    token: Option<String>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    gate: RateLimitGate,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("authenticated", &self.token.is_some())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates an unauthenticated client.
    #[must_use]
    pub fn new(client: Client, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            token: None,
            policy,
            clock,
            gate: RateLimitGate::new(),
        }
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    ///
    /// Blank tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Returns true if requests carry a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Retry settings in effect.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// Returns `None` on 404, when a server-mandated wait exceeds the budget,
    /// when every attempt fails, or when a 2xx body is not JSON.
    #[instrument(skip(self), fields(max_retries = self.policy.max_retries()))]
    pub async fn query_api(&self, url: &str) -> Option<Value> {
        let max_retries = self.policy.max_retries();

        for attempt in 1..=max_retries {
            self.gate.wait_turn(self.clock.as_ref()).await;
            let is_last = attempt == max_retries;

            let response = match self.request(url).send().await {
                Ok(response) => response,
                Err(error) => {
                    let delay = self.policy.transient_delay(attempt);
                    warn!(attempt, error = %error, "API request failed");
                    if !is_last {
                        self.clock.sleep(delay).await;
                    }
                    continue;
                }
            };

            let status = response.status();
            match decide(
                &self.policy,
                status,
                response.headers(),
                attempt,
                self.clock.now(),
            ) {
                ApiDecision::Accept => {
                    return match response.json::<Value>().await {
                        Ok(value) => {
                            debug!(attempt, "API request succeeded");
                            Some(value)
                        }
                        Err(error) => {
                            warn!(error = %error, "API response is not valid JSON");
                            None
                        }
                    };
                }
                ApiDecision::NotFound => {
                    debug!("API resource not found");
                    return None;
                }
                ApiDecision::GiveUp { requested } => {
                    warn!(
                        status = status.as_u16(),
                        requested_secs = requested.as_secs(),
                        max_wait_secs = self.policy.max_wait().as_secs(),
                        "rate-limit wait exceeds budget, giving up"
                    );
                    return None;
                }
                ApiDecision::Backoff { delay, cause } => {
                    if is_last {
                        debug!(status = status.as_u16(), attempt, "no attempts left");
                        continue;
                    }
                    if cause.is_rate_limit() {
                        info!(
                            status = status.as_u16(),
                            attempt,
                            delay_secs = delay.as_secs(),
                            ?cause,
                            "rate limited, waiting"
                        );
                        self.gate.hold_for(self.clock.now(), delay);
                    } else {
                        debug!(
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis(),
                            "transient failure, retrying"
                        );
                        self.clock.sleep(delay).await;
                    }
                }
            }
        }

        warn!(attempts = max_retries, "API retries exhausted");
        None
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION);
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }
}
