//! Repository citations assembled from GitHub contributor and repository metadata.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{CitationRecord, Contributor};
use crate::api::{ApiClient, DEFAULT_API_BASE_URL};
use crate::clock::Clock;
use crate::parser::RepoCoordinate;

/// Suffix GitHub appends to app and bot account names.
pub const BOT_SUFFIX: &str = "[bot]";

/// Default DOI resolver used for content negotiation.
pub const DEFAULT_DOI_RESOLVER: &str = "https://doi.org";

/// Entry of `GET /repos/{owner}/{repo}/contributors`.
#[derive(Debug, Deserialize)]
struct ContributorEntry {
    login: String,
    #[serde(default)]
    url: Option<String>,
}

/// The part of `GET /users/{login}` we read.
#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    name: Option<String>,
}

/// The part of `GET /repos/{owner}/{repo}` we read.
#[derive(Debug, Deserialize)]
struct RepoMetadata {
    #[serde(default)]
    updated_at: Option<String>,
}

/// Builds citations for repository and DOI links.
///
/// Holds the GitHub [`ApiClient`] for repository metadata and a plain HTTP
/// client for DOI content negotiation.
pub struct CitationBuilder {
    api: ApiClient,
    pub(super) http: Client,
    clock: Arc<dyn Clock>,
    api_base: String,
    pub(super) doi_resolver: String,
    filter_bots: bool,
}

impl std::fmt::Debug for CitationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitationBuilder")
            .field("api", &self.api)
            .field("api_base", &self.api_base)
            .field("doi_resolver", &self.doi_resolver)
            .field("filter_bots", &self.filter_bots)
            .finish_non_exhaustive()
    }
}

impl CitationBuilder {
    /// Creates a builder against the public GitHub API with bot filtering on.
    #[must_use]
    pub fn new(api: ApiClient, http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            http,
            clock,
            api_base: DEFAULT_API_BASE_URL.to_string(),
            doi_resolver: DEFAULT_DOI_RESOLVER.to_string(),
            filter_bots: true,
        }
    }

    /// Overrides the GitHub API base URL (for testing with mock servers).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the DOI resolver (for testing with mock servers).
    #[must_use]
    pub fn with_doi_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.doi_resolver = resolver.into().trim_end_matches('/').to_string();
        self
    }

    /// Enables or disables removal of bot contributors.
    #[must_use]
    pub fn with_bot_filter(mut self, filter_bots: bool) -> Self {
        self.filter_bots = filter_bots;
        self
    }

    /// Lists the repository's author names in contributor order.
    ///
    /// Each contributor's profile is looked up for a display name; a failed
    /// lookup or a blank name falls back to the login. Bots are dropped after
    /// name resolution when filtering is enabled.
    ///
    /// Returns `None` if `repo_url` is not a repository link or the
    /// contributor list cannot be fetched.
    #[instrument(skip(self))]
    pub async fn get_repo_authors(&self, repo_url: &str) -> Option<Vec<String>> {
        let coordinate = RepoCoordinate::from_url(repo_url)?;
        let contributors_url = format!(
            "{}/repos/{}/contributors",
            self.api_base,
            coordinate.api_path()
        );

        let listing = self.api.query_api(&contributors_url).await?;
        let entries: Vec<ContributorEntry> = match serde_json::from_value(listing) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(repo = %coordinate, error = %error, "unexpected contributor list shape");
                return None;
            }
        };
        debug!(repo = %coordinate, count = entries.len(), "fetched contributors");

        let mut authors = Vec::with_capacity(entries.len());
        for entry in entries {
            let contributor = self.resolve_contributor(entry).await;
            if self.filter_bots && contributor.is_bot() {
                debug!(login = %contributor.username, "skipping bot contributor");
                continue;
            }
            authors.push(contributor.resolved_name().to_string());
        }
        Some(authors)
    }

    async fn resolve_contributor(&self, entry: ContributorEntry) -> Contributor {
        let profile_url = entry.url.unwrap_or_else(|| {
            format!(
                "{}/users/{}",
                self.api_base,
                urlencoding::encode(&entry.login)
            )
        });

        let display_name = self
            .api
            .query_api(&profile_url)
            .await
            .and_then(|value| serde_json::from_value::<UserProfile>(value).ok())
            .and_then(|profile| profile.name);

        Contributor {
            username: entry.login,
            display_name,
        }
    }

    /// Builds a citation record for a repository link.
    ///
    /// Authors are a hard prerequisite: if they cannot be fetched no record is
    /// produced. The year comes from the repository's `updated_at`.
    #[instrument(skip(self))]
    pub async fn cite_repository(&self, repo_url: &str) -> Option<CitationRecord> {
        let coordinate = RepoCoordinate::from_url(repo_url)?;
        let authors = self.get_repo_authors(repo_url).await?;

        let repo_api_url = format!("{}/repos/{}", self.api_base, coordinate.api_path());
        let metadata = self.api.query_api(&repo_api_url).await?;
        let year = publication_year(metadata)?;

        let record = CitationRecord {
            key: coordinate.name.to_lowercase(),
            title: coordinate.name,
            authors,
            source_url: repo_url.to_string(),
            year,
            accessed: self.clock.now().date_naive(),
        };
        info!(key = %record.key, authors = record.authors.len(), "built repository citation");
        Some(record)
    }
}

/// First four characters of `updated_at`, when present.
fn publication_year(metadata: Value) -> Option<String> {
    let metadata: RepoMetadata = match serde_json::from_value(metadata) {
        Ok(metadata) => metadata,
        Err(error) => {
            warn!(error = %error, "unexpected repository metadata shape");
            return None;
        }
    };
    let Some(updated_at) = metadata.updated_at else {
        warn!("repository metadata has no updated_at");
        return None;
    };
    let year: String = updated_at.chars().take(4).collect();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        Some(year)
    } else {
        warn!(%updated_at, "unparseable updated_at");
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publication_year_takes_prefix() {
        assert_eq!(
            publication_year(json!({"updated_at": "2025-03-01T12:00:00Z"})),
            Some("2025".to_string())
        );
    }

    #[test]
    fn test_publication_year_missing_or_malformed() {
        assert_eq!(publication_year(json!({})), None);
        assert_eq!(publication_year(json!({"updated_at": null})), None);
        assert_eq!(publication_year(json!({"updated_at": "soon"})), None);
        assert_eq!(publication_year(json!([1, 2])), None);
    }

    #[test]
    fn test_contributor_entry_url_is_optional() {
        let entry: ContributorEntry =
            serde_json::from_value(json!({"login": "octocat", "type": "User"})).unwrap();
        assert_eq!(entry.login, "octocat");
        assert!(entry.url.is_none());
    }
}
