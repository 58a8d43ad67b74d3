//! Citation assembly and BibTeX rendering.
//!
//! Repository citations are built from GitHub metadata by
//! [`CitationBuilder`]; DOI citations are fetched verbatim from the resolver by
//! [`CitationBuilder::get_doi_citation`].

mod bibtex;
mod doi;
mod github;

pub use bibtex::BibtexFields;
pub use github::{BOT_SUFFIX, CitationBuilder, DEFAULT_DOI_RESOLVER};

use chrono::NaiveDate;

/// One contributor from a repository's contributor list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    /// Account login.
    pub username: String,
    /// Profile display name, when the lookup succeeded and it was set.
    pub display_name: Option<String>,
}

impl Contributor {
    /// Display name if present and non-empty, else the username.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    /// True if the login or the resolved name carries the bot suffix.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.username.ends_with(BOT_SUFFIX) || self.resolved_name().ends_with(BOT_SUFFIX)
    }
}

/// A fully populated repository citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationRecord {
    /// Entry key (repository name, lowercased).
    pub key: String,
    /// Repository name as it appears in the URL.
    pub title: String,
    /// Author names in contributor order.
    pub authors: Vec<String>,
    /// Repository URL as given.
    pub source_url: String,
    /// Year of the last repository update.
    pub year: String,
    /// Date the citation was generated.
    pub accessed: NaiveDate,
}

impl CitationRecord {
    /// Renders the record as a `@misc` BibTeX entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use depcite_core::citation::CitationRecord;
    ///
    /// let record = CitationRecord {
    ///     key: "snakecite".into(),
    ///     title: "snakecite".into(),
    ///     authors: vec!["Ada Lovelace".into(), "octocat".into()],
    ///     source_url: "https://github.com/magikcarp/snakecite".into(),
    ///     year: "2024".into(),
    ///     accessed: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
    /// };
    /// let bib = record.to_bibtex();
    /// assert!(bib.starts_with("@misc{snakecite,"));
    /// assert!(bib.contains("author = {Ada Lovelace and octocat}"));
    /// assert!(bib.contains("urldate = {2026-10-16}"));
    /// ```
    #[must_use]
    pub fn to_bibtex(&self) -> String {
        format!(
            "@misc{{{key},\n    title = {{{title}}},\n    author = {{{authors}}},\n    url = {{{url}}},\n    date = {{{year}}},\n    urldate = {{{accessed}}}\n}}",
            key = self.key,
            title = self.title,
            authors = self.authors.join(" and "),
            url = self.source_url,
            year = self.year,
            accessed = self.accessed.format("%Y-%m-%d"),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record() -> CitationRecord {
        CitationRecord {
            key: "snakemake".to_string(),
            title: "Snakemake".to_string(),
            authors: vec!["Johannes Köster".to_string(), "fgvieira".to_string()],
            source_url: "https://github.com/snakemake/Snakemake".to_string(),
            year: "2025".to_string(),
            accessed: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        }
    }

    // ==================== Contributor Tests ====================

    #[test]
    fn test_resolved_name_prefers_display_name() {
        let c = Contributor {
            username: "octocat".to_string(),
            display_name: Some("The Octocat".to_string()),
        };
        assert_eq!(c.resolved_name(), "The Octocat");
    }

    #[test]
    fn test_resolved_name_falls_back_on_missing_or_blank() {
        let missing = Contributor {
            username: "octocat".to_string(),
            display_name: None,
        };
        let blank = Contributor {
            username: "octocat".to_string(),
            display_name: Some("  ".to_string()),
        };
        assert_eq!(missing.resolved_name(), "octocat");
        assert_eq!(blank.resolved_name(), "octocat");
    }

    #[test]
    fn test_is_bot_checks_username_and_name() {
        let by_login = Contributor {
            username: "dependabot[bot]".to_string(),
            display_name: Some("Dependabot".to_string()),
        };
        let by_name = Contributor {
            username: "ci-helper".to_string(),
            display_name: Some("ci-helper[bot]".to_string()),
        };
        let human = Contributor {
            username: "robot".to_string(),
            display_name: None,
        };
        assert!(by_login.is_bot());
        assert!(by_name.is_bot());
        assert!(!human.is_bot());
    }

    // ==================== Rendering Tests ====================

    #[test]
    fn test_to_bibtex_exact_layout() {
        let expected = "@misc{snakemake,\n    title = {Snakemake},\n    author = {Johannes Köster and fgvieira},\n    url = {https://github.com/snakemake/Snakemake},\n    date = {2025},\n    urldate = {2026-01-05}\n}";
        assert_eq!(record().to_bibtex(), expected);
    }

    #[test]
    fn test_to_bibtex_field_order() {
        let bib = record().to_bibtex();
        let positions: Vec<usize> = ["title =", "author =", "url =", "date =", "urldate ="]
            .iter()
            .map(|field| bib.find(field).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_to_bibtex_single_author_has_no_separator() {
        let mut r = record();
        r.authors = vec!["solo".to_string()];
        assert!(r.to_bibtex().contains("author = {solo},"));
    }

    #[test]
    fn test_to_bibtex_round_trips_through_field_reader() {
        let r = record();
        let fields = BibtexFields::parse(&r.to_bibtex()).unwrap();
        assert_eq!(fields.entry_type(), "misc");
        assert_eq!(fields.key(), "snakemake");
        assert_eq!(fields.get("title"), Some("Snakemake"));
        assert_eq!(fields.authors(), r.authors);
        assert_eq!(fields.get("date"), Some("2025"));
        assert_eq!(fields.get("urldate"), Some("2026-01-05"));
    }
}
