//! Shared User-Agent string for registry, GitHub API, and DOI traffic.
//!
//! GitHub rejects API requests without a User-Agent, so every client built by
//! [`crate::http_client`] sends this one.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/magikcarp/snakecite";

/// Default User-Agent for all outbound requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("depcite/{version} (citation-tool; +{PROJECT_UA_URL})")
}
