//! Output of a citation run: BibTeX units and diagnostics.

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use tracing::warn;

/// Why a target or dependency produced no citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// URL target is neither a DOI nor a repository link.
    UnableToCite,
    /// DOI resolver request failed.
    RequestFailed,
    /// No registry yielded a citable link for a dependency.
    NoCitableSource,
    /// A link was found but its citation could not be built.
    CitationUnavailable,
    /// A manifest could not be read or parsed.
    ManifestUnreadable,
}

/// One non-fatal problem, reported on the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// The target, dependency, or file concerned.
    pub subject: String,
    /// Extra context (the link tried, the parse error).
    pub detail: Option<String>,
    /// When the problem was observed.
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    /// Creates a diagnostic without extra detail.
    #[must_use]
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            detail: None,
            at,
        }
    }

    /// Attaches extra context.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Human-readable message without the timestamp prefix.
    #[must_use]
    pub fn message(&self) -> String {
        let subject = &self.subject;
        let base = match self.kind {
            DiagnosticKind::UnableToCite => format!("Unable to cite {subject}"),
            DiagnosticKind::RequestFailed => format!("Error requesting {subject}"),
            DiagnosticKind::NoCitableSource => format!("No citable source found for {subject}"),
            DiagnosticKind::CitationUnavailable => {
                format!("Unable to build citation for {subject}")
            }
            DiagnosticKind::ManifestUnreadable => format!("Skipping {subject}"),
        };
        match &self.detail {
            Some(detail) => format!("{base}: {detail}"),
            None => base,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[WARNING] {}: {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.message()
        )
    }
}

/// Receiver of run output.
pub trait CitationSink {
    /// One complete BibTeX unit.
    fn emit_citation(&mut self, citation: &str);

    /// One diagnostic.
    fn emit_diagnostic(&mut self, diagnostic: &Diagnostic);
}

/// Writes citations to one stream and diagnostics to another.
///
/// [`ConsoleSink::stdio`] writes citations to stdout and diagnostics to
/// stderr, so stdout stays pure BibTeX.
#[derive(Debug)]
pub struct ConsoleSink<O: Write, E: Write> {
    out: O,
    err: E,
}

impl ConsoleSink<io::Stdout, io::Stderr> {
    /// Sink over the process's standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    /// Sink over arbitrary writers.
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Returns the writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> CitationSink for ConsoleSink<O, E> {
    fn emit_citation(&mut self, citation: &str) {
        if let Err(error) = writeln!(self.out, "{}", citation.trim_end()).and_then(|()| self.out.flush())
        {
            warn!(error = %error, "failed to write citation");
        }
    }

    fn emit_diagnostic(&mut self, diagnostic: &Diagnostic) {
        if let Err(error) = writeln!(self.err, "{diagnostic}") {
            warn!(error = %error, "failed to write diagnostic");
        }
    }
}

/// Collects output in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub citations: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CitationSink for MemorySink {
    fn emit_citation(&mut self, citation: &str) {
        self.citations.push(citation.to_string());
    }

    fn emit_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}
