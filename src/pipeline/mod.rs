//! Target dispatch and per-dependency resolution.
//!
//! [`Pipeline::run`] decides what the target is and drives the rest of the
//! crate:
//!
//! - **URL**: cite the DOI or repository link directly.
//! - **File**: parse the manifest, then probe and cite each dependency.
//! - **Directory**: handle every `.yaml`/`.yml` file in it, sorted by name, with
//!   pacing between dependency probes.
//! - **Anything else**: [`CiteError::UnreachableTarget`].
//!
//! A dependency that cannot be cited produces a [`Diagnostic`]; it never stops
//! the run. Dependencies of one manifest are resolved through an ordered
//! bounded stream, so output follows manifest order for any `jobs` value.

mod sink;

pub use sink::{CitationSink, ConsoleSink, Diagnostic, DiagnosticKind, MemorySink};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, Pacer, RetryPolicy};
use crate::citation::CitationBuilder;
use crate::clock::Clock;
use crate::config::CiteConfig;
use crate::error::CiteError;
use crate::http_client::build_http_client;
use crate::parser::{
    CitableLink, DependencyName, ParseError, classify_link, is_manifest_file, is_url,
    read_manifest,
};
use crate::registry::RegistryProber;

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Citations emitted.
    pub cited: usize,
    /// Targets or dependencies that produced a diagnostic instead.
    pub unresolved: usize,
    /// Manifests that could not be read or parsed.
    pub manifests_failed: usize,
}

impl RunSummary {
    /// True if nothing went unresolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved == 0 && self.manifests_failed == 0
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Cited(_) => self.cited += 1,
            Outcome::Unresolved(_) => self.unresolved += 1,
        }
    }
}

/// Result of resolving one target or dependency.
enum Outcome {
    Cited(String),
    Unresolved(Diagnostic),
}

impl Outcome {
    fn emit(&self, sink: &mut dyn CitationSink) {
        match self {
            Self::Cited(citation) => sink.emit_citation(citation),
            Self::Unresolved(diagnostic) => sink.emit_diagnostic(diagnostic),
        }
    }
}

/// Drives citation runs.
pub struct Pipeline {
    prober: RegistryProber,
    builder: CitationBuilder,
    clock: Arc<dyn Clock>,
    jobs: usize,
    pace: Duration,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("prober", &self.prober)
            .field("builder", &self.builder)
            .field("jobs", &self.jobs)
            .field("pace", &self.pace)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds a pipeline against the public registries and GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`CiteError::InvalidConfig`] for out-of-range options and
    /// [`CiteError::HttpClient`] if the HTTP client cannot be built.
    pub fn from_config(config: &CiteConfig, clock: Arc<dyn Clock>) -> Result<Self, CiteError> {
        config.validate()?;
        let http = build_http_client(config.http_timeouts)?;

        let api = ApiClient::new(
            http.clone(),
            RetryPolicy::new(config.max_retries, config.max_wait),
            Arc::clone(&clock),
        )
        .with_token(config.github_token.clone());
        let builder = CitationBuilder::new(api, http.clone(), Arc::clone(&clock))
            .with_bot_filter(config.filter_bots);

        Ok(Self::from_parts(
            RegistryProber::new(http),
            builder,
            clock,
            config,
        ))
    }

    /// Assembles a pipeline from prepared components.
    ///
    /// Only `jobs` and `pace` are read from `config`.
    #[must_use]
    pub fn from_parts(
        prober: RegistryProber,
        builder: CitationBuilder,
        clock: Arc<dyn Clock>,
        config: &CiteConfig,
    ) -> Self {
        Self {
            prober,
            builder,
            clock,
            jobs: config.jobs.max(1),
            pace: config.pace,
        }
    }

    /// Cites `target`, writing citations and diagnostics to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`CiteError::UnreachableTarget`] when `target` is not a URL, an
    /// existing file, or an existing directory, and [`CiteError::Parse`] when a
    /// directory target cannot be listed.
    #[instrument(skip(self, target, sink), fields(input = target))]
    pub async fn run(
        &self,
        target: &str,
        sink: &mut dyn CitationSink,
    ) -> Result<RunSummary, CiteError> {
        let path = Path::new(target);
        let summary = if is_url(target) {
            self.run_url(target, sink).await
        } else if path.is_file() {
            self.run_manifest(path, &Pacer::new(Duration::ZERO), sink)
                .await
        } else if path.is_dir() {
            self.run_directory(path, sink).await?
        } else {
            return Err(CiteError::unreachable(target));
        };

        info!(
            cited = summary.cited,
            unresolved = summary.unresolved,
            manifests_failed = summary.manifests_failed,
            "run finished"
        );
        Ok(summary)
    }

    async fn run_url(&self, target: &str, sink: &mut dyn CitationSink) -> RunSummary {
        let outcome = match classify_link(target) {
            CitableLink::Doi(url) => match self.builder.get_doi_citation(&url).await {
                Some(citation) => Outcome::Cited(citation),
                None => Outcome::Unresolved(self.diagnostic(DiagnosticKind::RequestFailed, target)),
            },
            CitableLink::Repo(url) => match self.builder.cite_repository(&url).await {
                Some(record) => Outcome::Cited(record.to_bibtex()),
                None => Outcome::Unresolved(
                    self.diagnostic(DiagnosticKind::CitationUnavailable, target),
                ),
            },
            CitableLink::Unclassified(_) => {
                Outcome::Unresolved(self.diagnostic(DiagnosticKind::UnableToCite, target))
            }
        };

        let mut summary = RunSummary::default();
        summary.record(&outcome);
        outcome.emit(sink);
        summary
    }

    #[instrument(skip(self, path, pacer, sink), fields(path = %path.display()))]
    async fn run_manifest(
        &self,
        path: &Path,
        pacer: &Pacer,
        sink: &mut dyn CitationSink,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        let dependencies = match read_manifest(path) {
            Ok(dependencies) => dependencies,
            Err(error) => {
                warn!(error = %error, "manifest skipped");
                summary.manifests_failed += 1;
                sink.emit_diagnostic(
                    &self
                        .diagnostic(DiagnosticKind::ManifestUnreadable, path.display().to_string())
                        .with_detail(error.to_string()),
                );
                return summary;
            }
        };
        info!(dependencies = dependencies.len(), jobs = self.jobs, "resolving manifest");

        let mut outcomes = std::pin::pin!(
            stream::iter(dependencies.iter())
                .map(|dependency| async move {
                    pacer.acquire(self.clock.as_ref()).await;
                    self.resolve_dependency(dependency).await
                })
                .buffered(self.jobs)
        );

        while let Some(outcome) = outcomes.next().await {
            summary.record(&outcome);
            outcome.emit(sink);
        }
        summary
    }

    async fn run_directory(
        &self,
        dir: &Path,
        sink: &mut dyn CitationSink,
    ) -> Result<RunSummary, CiteError> {
        let manifests = list_manifests(dir)?;
        info!(dir = %dir.display(), manifests = manifests.len(), "citing directory");

        let pacer = Pacer::new(self.pace);
        let mut summary = RunSummary::default();
        for manifest in manifests {
            let part = self.run_manifest(&manifest, &pacer, sink).await;
            summary.cited += part.cited;
            summary.unresolved += part.unresolved;
            summary.manifests_failed += part.manifests_failed;
        }
        Ok(summary)
    }

    /// Probes registries for `dependency` and cites what they point to.
    #[instrument(skip(self, dependency), fields(dependency = %dependency))]
    async fn resolve_dependency(&self, dependency: &DependencyName) -> Outcome {
        let link = match self.prober.search_repositories(dependency).await {
            Some(CitableLink::Unclassified(_)) | None => {
                return Outcome::Unresolved(
                    self.diagnostic(DiagnosticKind::NoCitableSource, dependency.as_str()),
                );
            }
            Some(link) => link,
        };

        let citation = match &link {
            CitableLink::Doi(url) => self.builder.get_doi_citation(url).await,
            CitableLink::Repo(url) => self
                .builder
                .cite_repository(url)
                .await
                .map(|record| record.to_bibtex()),
            CitableLink::Unclassified(_) => None,
        };

        match citation {
            Some(citation) => {
                debug!(link = %link, "dependency cited");
                Outcome::Cited(citation)
            }
            None => Outcome::Unresolved(
                self.diagnostic(DiagnosticKind::CitationUnavailable, dependency.as_str())
                    .with_detail(link.as_str()),
            ),
        }
    }

    fn diagnostic(&self, kind: DiagnosticKind, subject: impl Into<String>) -> Diagnostic {
        Diagnostic::new(kind, subject, self.clock.now())
    }
}

/// Manifest files directly inside `dir`, sorted by file name.
fn list_manifests(dir: &Path) -> Result<Vec<PathBuf>, CiteError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ParseError::io(dir, e))?;

    let mut manifests: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_manifest_file(path))
        .collect();
    manifests.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(count = manifests.len(), "listed manifests");
    Ok(manifests)
}
