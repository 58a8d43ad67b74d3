//! Package registry probing for citable links.
//!
//! A bare dependency name is looked up on three registries in a fixed order.
//! Each probe is independent: a network failure or a non-success status
//! skips that registry. The first page containing a DOI or a GitHub
//! repository link wins.
//!
//! | Order | Source | URL |
//! |-------|--------|-----|
//! | 1 | PyPI | `https://pypi.org/pypi/<name>/json` |
//! | 2 | Bioconda | `https://bioconda.github.io/recipes/<name>/README.html` |
//! | 3 | conda-forge | `https://anaconda.org/conda-forge/<name>` |

use std::fmt;

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::parser::{CitableLink, DependencyName, find_citable_link};

/// Default PyPI JSON API base.
pub const DEFAULT_PYPI_BASE: &str = "https://pypi.org/pypi";
/// Default Bioconda recipe documentation base.
pub const DEFAULT_BIOCONDA_BASE: &str = "https://bioconda.github.io/recipes";
/// Default conda-forge channel base on anaconda.org.
pub const DEFAULT_CONDA_FORGE_BASE: &str = "https://anaconda.org/conda-forge";

/// A registry consulted for citable links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSource {
    /// Python Package Index JSON API.
    PyPi,
    /// Bioconda recipe pages.
    Bioconda,
    /// conda-forge channel pages.
    CondaForge,
}

impl ProbeSource {
    /// All sources in probe order.
    pub const ORDER: [Self; 3] = [Self::PyPi, Self::Bioconda, Self::CondaForge];

    /// Short label for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PyPi => "pypi",
            Self::Bioconda => "bioconda",
            Self::CondaForge => "conda-forge",
        }
    }
}

impl fmt::Display for ProbeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Base URLs of the three registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEndpoints {
    pub pypi: String,
    pub bioconda: String,
    pub conda_forge: String,
}

impl Default for ProbeEndpoints {
    fn default() -> Self {
        Self {
            pypi: DEFAULT_PYPI_BASE.to_string(),
            bioconda: DEFAULT_BIOCONDA_BASE.to_string(),
            conda_forge: DEFAULT_CONDA_FORGE_BASE.to_string(),
        }
    }
}

impl ProbeEndpoints {
    /// Points all three sources under one server, at `/pypi`, `/bioconda`
    /// and `/conda-forge`.
    #[must_use]
    pub fn under(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            pypi: format!("{base}/pypi"),
            bioconda: format!("{base}/bioconda"),
            conda_forge: format!("{base}/conda-forge"),
        }
    }

    /// Probe URL for `name` on `source`.
    ///
    /// # Examples
    ///
    /// ```
    /// use depcite_core::registry::{ProbeEndpoints, ProbeSource};
    ///
    /// let endpoints = ProbeEndpoints::default();
    /// assert_eq!(
    ///     endpoints.url_for(ProbeSource::PyPi, "numpy"),
    ///     "https://pypi.org/pypi/numpy/json"
    /// );
    /// ```
    #[must_use]
    pub fn url_for(&self, source: ProbeSource, name: &str) -> String {
        let name = urlencoding::encode(name);
        match source {
            ProbeSource::PyPi => format!("{}/{name}/json", self.pypi.trim_end_matches('/')),
            ProbeSource::Bioconda => {
                format!("{}/{name}/README.html", self.bioconda.trim_end_matches('/'))
            }
            ProbeSource::CondaForge => {
                format!("{}/{name}", self.conda_forge.trim_end_matches('/'))
            }
        }
    }
}

/// Looks up dependency names on package registries.
#[derive(Debug, Clone)]
pub struct RegistryProber {
    client: Client,
    endpoints: ProbeEndpoints,
}

impl RegistryProber {
    /// Creates a prober against the public registries.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_endpoints(client, ProbeEndpoints::default())
    }

    /// Creates a prober against custom registry bases.
    #[must_use]
    pub fn with_endpoints(client: Client, endpoints: ProbeEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Registry bases in use.
    #[must_use]
    pub fn endpoints(&self) -> &ProbeEndpoints {
        &self.endpoints
    }

    /// Finds a citable link for `dependency`.
    ///
    /// Probes PyPI, then Bioconda, then conda-forge, stopping at the first page
    /// containing a DOI (preferred) or a GitHub repository link. Returns `None`
    /// when no registry yields one.
    #[instrument(skip(self, dependency), fields(dependency = %dependency))]
    pub async fn search_repositories(&self, dependency: &DependencyName) -> Option<CitableLink> {
        for source in ProbeSource::ORDER {
            let Some(body) = self.probe(source, dependency.as_str()).await else {
                continue;
            };
            if let Some(link) = find_citable_link(&body) {
                info!(%source, kind = link.kind(), link = %link, "found citable link");
                return Some(link);
            }
            debug!(%source, "no citable link on registry page");
        }
        debug!("no registry yielded a citable link");
        None
    }

    /// Fetches the page for `name` on `source`; `None` on any failure.
    async fn probe(&self, source: ProbeSource, name: &str) -> Option<String> {
        let url = self.endpoints.url_for(source, name);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(%source, %url, error = %error, "registry probe failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%source, %url, status = status.as_u16(), "registry probe skipped");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(error) => {
                debug!(%source, %url, error = %error, "failed to read registry page");
                None
            }
        }
    }
}
