//! Builders wiring library components to a mock server and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use depcite_core::{
    ApiClient, CitationBuilder, CiteConfig, HttpTimeouts, ManualClock, Pipeline, ProbeEndpoints,
    RegistryProber, RetryPolicy, build_http_client,
};
use serde_json::{Value, json};
use wiremock::MockServer;

/// 2026-10-16 00:00:00 UTC.
pub const START_TIMESTAMP: i64 = 1_792_108_800;

/// Path prefix the fake GitHub API is mounted under.
pub const GITHUB_PREFIX: &str = "/gh";

/// Path prefix the fake DOI resolver is mounted under.
pub const DOI_PREFIX: &str = "/doi";

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_timestamp(START_TIMESTAMP))
}

pub fn http_client() -> reqwest::Client {
    build_http_client(HttpTimeouts {
        connect_timeout_secs: 2,
        read_timeout_secs: 5,
    })
    .unwrap()
}

pub fn api_client(clock: &Arc<ManualClock>, max_retries: u32) -> ApiClient {
    ApiClient::new(
        http_client(),
        RetryPolicy::new(max_retries, Duration::from_secs(60)),
        clock.clone(),
    )
}

pub fn github_base(server: &MockServer) -> String {
    format!("{}{GITHUB_PREFIX}", server.uri())
}

pub fn citation_builder(server: &MockServer, clock: &Arc<ManualClock>) -> CitationBuilder {
    CitationBuilder::new(api_client(clock, 3), http_client(), clock.clone())
        .with_api_base(github_base(server))
        .with_doi_resolver(format!("{}{DOI_PREFIX}", server.uri()))
}

pub fn prober(server: &MockServer) -> RegistryProber {
    RegistryProber::with_endpoints(http_client(), ProbeEndpoints::under(&server.uri()))
}

pub fn pipeline(server: &MockServer, clock: &Arc<ManualClock>, config: &CiteConfig) -> Pipeline {
    Pipeline::from_parts(
        prober(server),
        citation_builder(server, clock),
        clock.clone(),
        config,
    )
}

/// Contributor list entry whose profile URL points at the mock server.
pub fn contributor(server: &MockServer, login: &str) -> Value {
    json!({
        "login": login,
        "url": format!("{}/users/{login}", github_base(server)),
        "type": "User",
        "contributions": 10,
    })
}

pub fn doi_bibtex(key: &str) -> String {
    format!(
        " @article{{{key}, title={{A tool}}, author={{Doe, Jane and Roe, Rich}}, year={{2021}}, DOI={{10.1234/{key}}}}}\n"
    )
}
