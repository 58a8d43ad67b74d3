//! DOI resolver-link detection and DOI discovery in page bodies.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Canonical resolver prefix used when normalizing DOIs found in text.
pub const DOI_RESOLVER_PREFIX: &str = "https://doi.org/";

const RESOLVER_HOST: &str = "doi.org/";

/// DOI resolver URL: `http(s)://doi.org/10.XXXX/suffix`, anchored at the start.
///
/// Crossref reports this suffix class matches ~99.3% of real DOIs; it is
/// intentionally permissive.
#[allow(clippy::expect_used)]
static DOI_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://doi\.org/10\.\d{4,9}/[-._;()/:A-Za-z0-9]+").expect("DOI URL regex is valid") // Static pattern, safe to panic
});

/// DOI anywhere in text, with optional scheme and resolver host.
///
/// The suffix must end in a digit so trailing punctuation and markup are not captured.
#[allow(clippy::expect_used)]
static DOI_IN_TEXT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:doi\.org/)?(10\.\d{4,9}/[-._;()/:A-Za-z0-9]+[0-9])")
        .expect("DOI text regex is valid") // Static pattern, safe to panic
});

/// Returns true if `input` starts with an HTTP(S) `doi.org` resolver link.
///
/// # Examples
///
/// ```
/// use depcite_core::parser::is_doi_url;
///
/// assert!(is_doi_url("https://doi.org/10.1093/bioinformatics/bts480"));
/// assert!(!is_doi_url("doi.org/10.1093/bioinformatics/bts480"));
/// assert!(!is_doi_url("10.1093/bioinformatics/bts480"));
/// ```
#[must_use]
pub fn is_doi_url(input: &str) -> bool {
    DOI_URL_PATTERN.is_match(input)
}

/// Bare DOI (`10.XXXX/suffix`) of a resolver link, or `None` if `doi_url` is
/// not one.
///
/// # Examples
///
/// ```
/// use depcite_core::parser::bare_doi;
///
/// assert_eq!(
///     bare_doi("http://doi.org/10.1093/bioinformatics/bts480"),
///     Some("10.1093/bioinformatics/bts480")
/// );
/// assert_eq!(bare_doi("https://github.com/a/b"), None);
/// ```
#[must_use]
pub fn bare_doi(doi_url: &str) -> Option<&str> {
    if !is_doi_url(doi_url) {
        return None;
    }
    let start = doi_url.find(RESOLVER_HOST)? + RESOLVER_HOST.len();
    Some(&doi_url[start..])
}

/// Finds the first DOI in `text` and returns it as a `https://doi.org/` link.
#[must_use]
pub(crate) fn find_doi(text: &str) -> Option<String> {
    let caps = DOI_IN_TEXT_PATTERN.captures(text)?;
    let doi = caps.get(1)?.as_str();
    trace!(doi, "found DOI in text");
    Some(format!("{DOI_RESOLVER_PREFIX}{doi}"))
}
