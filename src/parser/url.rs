//! Generic URL validation and GitHub repository link detection.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use url::Url;

/// GitHub repository link, anchored at the start of the input.
///
/// Trailing path segments, queries, and fragments are tolerated:
/// `https://github.com/o/r/tree/main` is a link to `o/r`.
#[allow(clippy::expect_used)]
static REPO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/([\w\-]+)/([\w\-]+)").expect("repo URL regex is valid") // Static pattern, safe to panic
});

/// Unanchored variant used to find repository links inside page bodies.
#[allow(clippy::expect_used)]
static REPO_URL_IN_TEXT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://github\.com/[\w\-]+/[\w\-]+").expect("repo URL text regex is valid") // Static pattern, safe to panic
});

/// Returns true if `input` is an absolute URL with both a scheme and a host.
///
/// Malformed input yields `false`, never an error.
///
/// # Examples
///
/// ```
/// use depcite_core::parser::is_url;
///
/// assert!(is_url("https://pypi.org/"));
/// assert!(!is_url("www.google.com"));
/// assert!(!is_url("4.5"));
/// ```
#[must_use]
pub fn is_url(input: &str) -> bool {
    match Url::parse(input.trim()) {
        Ok(parsed) => !parsed.scheme().is_empty() && parsed.host_str().is_some_and(|h| !h.is_empty()),
        Err(e) => {
            trace!(input, error = %e, "not a URL");
            false
        }
    }
}

/// Returns true if `input` starts with `http(s)://github.com/<owner>/<name>`.
///
/// # Examples
///
/// ```
/// use depcite_core::parser::is_repo_url;
///
/// assert!(is_repo_url("https://github.com/magikcarp/snakecite"));
/// assert!(!is_repo_url("github.com/magikcarp/snakecite"));
/// ```
#[must_use]
pub fn is_repo_url(input: &str) -> bool {
    REPO_URL_PATTERN.is_match(input)
}

/// Finds the first GitHub repository link anywhere in `text`.
#[must_use]
pub(crate) fn find_repo_url(text: &str) -> Option<&str> {
    REPO_URL_IN_TEXT_PATTERN.find(text).map(|m| m.as_str())
}

/// Owner/name pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinate {
    /// Extracts the coordinate from a repository link.
    ///
    /// Returns `None` when `url` is not a repository link.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let caps = REPO_URL_PATTERN.captures(url)?;
        Some(Self {
            owner: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }

    /// `owner/name` path fragment used by the GitHub REST API.
    #[must_use]
    pub fn api_path(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== is_url Tests ====================

    #[test]
    fn test_is_url_accepts_absolute_urls() {
        assert!(is_url("https://www.google.com"));
        assert!(is_url("https://github.com/magikcarp/snakecite"));
        assert!(is_url("https://doi.org/10.1093/bioinformatics/bts480"));
        assert!(is_url("https://pypi.org/"));
        assert!(is_url("ftp://files.example.org/pub"));
    }

    #[test]
    fn test_is_url_rejects_missing_scheme() {
        assert!(!is_url("www.google.com"));
        assert!(!is_url("github.com/magikcarp/snakecite"));
    }

    #[test]
    fn test_is_url_rejects_numbers_and_garbage() {
        assert!(!is_url("45"));
        assert!(!is_url("4.5"));
        assert!(!is_url(""));
        assert!(!is_url("not a url at all"));
    }

    #[test]
    fn test_is_url_rejects_missing_authority() {
        assert!(!is_url("mailto:someone@example.com"));
        assert!(!is_url("file:///etc/environment.yaml"));
        assert!(!is_url("https://"));
    }

    // ==================== is_repo_url Tests ====================

    #[test]
    fn test_is_repo_url_https_and_http() {
        assert!(is_repo_url("https://github.com/magikcarp/snakecite"));
        assert!(is_repo_url("http://github.com/magikcarp/snakecite"));
    }

    #[test]
    fn test_is_repo_url_rejects_without_scheme() {
        assert!(!is_repo_url("github.com/magikcarp/snakecite"));
    }

    #[test]
    fn test_is_repo_url_rejects_other_hosts() {
        assert!(!is_repo_url("https://www.google.com"));
        assert!(!is_repo_url("https://gitlab.com/owner/repo"));
        assert!(!is_repo_url("4.5"));
    }

    #[test]
    fn test_is_repo_url_requires_owner_and_name() {
        assert!(!is_repo_url("https://github.com/magikcarp"));
        assert!(!is_repo_url("https://github.com/"));
    }

    #[test]
    fn test_is_repo_url_is_prefix_anchored() {
        assert!(is_repo_url("https://github.com/numpy/numpy/tree/main/doc"));
        assert!(is_repo_url("https://github.com/numpy/numpy.git"));
        assert!(!is_repo_url("see https://github.com/numpy/numpy"));
    }

    // ==================== RepoCoordinate Tests ====================

    #[test]
    fn test_repo_coordinate_from_url() {
        let coord = RepoCoordinate::from_url("https://github.com/snakemake/snakemake-wrappers").unwrap();
        assert_eq!(coord.owner, "snakemake");
        assert_eq!(coord.name, "snakemake-wrappers");
        assert_eq!(coord.api_path(), "snakemake/snakemake-wrappers");
        assert_eq!(coord.to_string(), "snakemake/snakemake-wrappers");
    }

    #[test]
    fn test_repo_coordinate_ignores_trailing_segments() {
        let coord = RepoCoordinate::from_url("https://github.com/pandas-dev/pandas.git").unwrap();
        assert_eq!(coord.name, "pandas");
    }

    #[test]
    fn test_repo_coordinate_none_for_non_repo() {
        assert!(RepoCoordinate::from_url("https://doi.org/10.1093/x").is_none());
    }

    #[test]
    fn test_find_repo_url_in_text() {
        let body = r#"{"home_page": "https://github.com/psf/requests", "x": 1}"#;
        assert_eq!(find_repo_url(body), Some("https://github.com/psf/requests"));
        assert_eq!(find_repo_url("nothing here"), None);
    }
}
