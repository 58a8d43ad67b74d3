//! Dependency extraction from environment manifests and plain dependency lists.
//!
//! Two formats are supported:
//!
//! - **Environment manifest** (`.yaml`/`.yml`, conda style): names are read from
//!   `- <name>` items after a `dependencies:` line.
//! - **Plain list** (any other extension, `requirements.txt` style): the leading
//!   token of each line is the dependency name.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::DependencyName;
use super::error::ParseError;

const DEPENDENCIES_MARKER: &str = "dependencies:";

#[allow(clippy::expect_used)]
static LIST_ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"- (\w[\w\-]*)").expect("manifest list item regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static LEADING_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\-]+").expect("dependency list token regex is valid") // Static pattern, safe to panic
});

/// Manifest syntax, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Conda-style environment file with a `dependencies:` list.
    Environment,
    /// One dependency token per line.
    PlainList,
}

impl ManifestFormat {
    /// Picks the format for `path`: `.yaml`/`.yml` (any case) is an environment
    /// manifest, everything else a plain list.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if is_manifest_file(path) {
            Self::Environment
        } else {
            Self::PlainList
        }
    }
}

/// Returns true for files directory mode should pick up (`.yaml`/`.yml`).
#[must_use]
pub fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Reads `path` and extracts its dependency names in file order.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read and
/// [`ParseError::MalformedManifestLine`] if an environment manifest has a
/// non-item line inside its `dependencies:` block.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn read_manifest(path: &Path) -> Result<Vec<DependencyName>, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    let format = ManifestFormat::from_path(path);
    debug!(?format, bytes = text.len(), "parsing manifest");

    match format {
        ManifestFormat::Environment => parse_environment_manifest(&text, path),
        ManifestFormat::PlainList => Ok(parse_dependency_list(&text)),
    }
}

/// Extracts dependency names from environment-manifest text.
///
/// Once a line reading exactly `dependencies:` (after trimming) is seen, every
/// following non-blank, non-comment line must contain a `- <name>` item. `path`
/// is only used for error reporting.
///
/// # Errors
///
/// Returns [`ParseError::MalformedManifestLine`] for the first line in the
/// dependency region that is not a list item.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use depcite_core::parser::parse_environment_manifest;
///
/// let text = "dependencies:\n  - numpy\n  - pandas\n";
/// let deps = parse_environment_manifest(text, Path::new("env.yaml")).unwrap();
/// let names: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
/// assert_eq!(names, ["numpy", "pandas"]);
/// ```
pub fn parse_environment_manifest(
    text: &str,
    path: &Path,
) -> Result<Vec<DependencyName>, ParseError> {
    let mut deps = Vec::new();
    let mut in_dependencies = false;

    for (index, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        if stripped == DEPENDENCIES_MARKER {
            in_dependencies = true;
            continue;
        }
        if !in_dependencies {
            continue;
        }

        let Some(caps) = LIST_ITEM_PATTERN.captures(line) else {
            return Err(ParseError::malformed_line(path, index + 1, line));
        };
        let name = &caps[1];
        trace!(line = index + 1, dependency = name, "found dependency");
        deps.push(DependencyName::new(name));
    }

    Ok(deps)
}

/// Extracts dependency names from a plain one-per-line list.
///
/// Lines without a leading name token (comments, blank lines, indented text)
/// are skipped.
///
/// # Examples
///
/// ```
/// use depcite_core::parser::parse_dependency_list;
///
/// let deps = parse_dependency_list("flask==2.0\n# comment\nrequests\n");
/// let names: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
/// assert_eq!(names, ["flask", "requests"]);
/// ```
#[must_use]
pub fn parse_dependency_list(text: &str) -> Vec<DependencyName> {
    text.lines()
        .filter_map(|line| LEADING_TOKEN_PATTERN.find(line))
        .map(|m| DependencyName::new(m.as_str()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(deps: &[DependencyName]) -> Vec<&str> {
        deps.iter().map(DependencyName::as_str).collect()
    }

    // ==================== Environment Manifest Tests ====================

    #[test]
    fn test_environment_manifest_basic() {
        let text = "dependencies:\n  - numpy\n  - pandas\n";
        let deps = parse_environment_manifest(text, Path::new("env.yaml")).unwrap();
        assert_eq!(names(&deps), ["numpy", "pandas"]);
    }

    #[test]
    fn test_environment_manifest_full_conda_file() {
        let text = "\
name: qc
channels:
  - conda-forge
  - bioconda
dependencies:
  # aligners
  - bwa=0.7.17

  - samtools>=1.15
  - python_abi
  - r-base
";
        let deps = parse_environment_manifest(text, Path::new("qc.yml")).unwrap();
        assert_eq!(names(&deps), ["bwa", "samtools", "python_abi", "r-base"]);
    }

    #[test]
    fn test_environment_manifest_channels_before_marker_ignored() {
        let text = "channels:\n  - conda-forge\n";
        let deps = parse_environment_manifest(text, Path::new("env.yaml")).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_environment_manifest_marker_must_be_whole_line() {
        let text = "build_dependencies: foo\n  - numpy\n";
        let deps = parse_environment_manifest(text, Path::new("env.yaml")).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_environment_manifest_malformed_line_fails_with_location() {
        let text = "dependencies:\n  - numpy\n  pip:\n";
        let err = parse_environment_manifest(text, Path::new("envs/env.yaml")).unwrap_err();
        match err {
            ParseError::MalformedManifestLine {
                path,
                line,
                content,
            } => {
                assert_eq!(path, Path::new("envs/env.yaml"));
                assert_eq!(line, 3);
                assert_eq!(content, "pip:");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_environment_manifest_nested_pip_items_are_captured() {
        let text = "dependencies:\n  - pip\n  - pip:\n    - snakemake-wrapper-utils\n";
        let deps = parse_environment_manifest(text, Path::new("env.yaml")).unwrap();
        assert_eq!(names(&deps), ["pip", "pip", "snakemake-wrapper-utils"]);
    }

    // ==================== Plain List Tests ====================

    #[test]
    fn test_plain_list_skips_comments() {
        let deps = parse_dependency_list("flask==2.0\n# comment\nrequests\n");
        assert_eq!(names(&deps), ["flask", "requests"]);
    }

    #[test]
    fn test_plain_list_skips_blank_and_indented_lines() {
        let deps = parse_dependency_list("\n   indented\nscikit-learn>=1.0\nsnake_case\n");
        assert_eq!(names(&deps), ["scikit-learn", "snake_case"]);
    }

    #[test]
    fn test_plain_list_empty_input() {
        assert!(parse_dependency_list("").is_empty());
    }

    // ==================== Dispatch Tests ====================

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ManifestFormat::from_path(Path::new("env.yaml")),
            ManifestFormat::Environment
        );
        assert_eq!(
            ManifestFormat::from_path(Path::new("ENV.YML")),
            ManifestFormat::Environment
        );
        assert_eq!(
            ManifestFormat::from_path(Path::new("requirements.txt")),
            ManifestFormat::PlainList
        );
        assert_eq!(
            ManifestFormat::from_path(Path::new("Pipfile")),
            ManifestFormat::PlainList
        );
    }

    #[test]
    fn test_read_manifest_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("env.yaml");
        std::fs::write(&yaml, "dependencies:\n  - numpy\n").unwrap();
        let txt = dir.path().join("requirements.txt");
        std::fs::write(&txt, "dependencies:\n  - numpy\n").unwrap();

        assert_eq!(names(&read_manifest(&yaml).unwrap()), ["numpy"]);
        assert_eq!(names(&read_manifest(&txt).unwrap()), ["dependencies"]);
    }

    #[test]
    fn test_read_manifest_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
