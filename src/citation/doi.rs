//! DOI citations by content negotiation against the resolver.

use reqwest::header::ACCEPT;
use tracing::{debug, info, instrument, warn};

use super::{BibtexFields, CitationBuilder};
use crate::parser::bare_doi;

const BIBTEX_MEDIA_TYPE: &str = "application/x-bibtex";

impl CitationBuilder {
    /// Fetches the BibTeX entry for a DOI link.
    ///
    /// The request goes to the configured resolver and the body is returned
    /// verbatim. A link that is not a DOI, a transport failure, or a
    /// non-success status yields `None`.
    #[instrument(skip(self))]
    pub async fn get_doi_citation(&self, doi_url: &str) -> Option<String> {
        let Some(doi) = bare_doi(doi_url) else {
            warn!("not a DOI link");
            return None;
        };
        let resolver_url = format!("{}/{doi}", self.doi_resolver);

        let response = match self
            .http
            .get(&resolver_url)
            .header(ACCEPT, BIBTEX_MEDIA_TYPE)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "DOI request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "DOI resolver returned an error");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                match BibtexFields::parse(&body) {
                    Some(entry) => info!(key = entry.key(), "fetched DOI citation"),
                    None => debug!(bytes = body.len(), "DOI citation is not parseable BibTeX"),
                }
                Some(body)
            }
            Err(error) => {
                warn!(error = %error, "failed to read DOI response body");
                None
            }
        }
    }
}
