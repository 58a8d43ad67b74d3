//! Minimal BibTeX field reader.
//!
//! Reads the first entry of a BibTeX text into its type, key and ordered
//! fields. Used to log the key of DOI citations returned by the resolver and to
//! check rendered repository citations.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

#[allow(clippy::expect_used)]
static AUTHOR_SPLIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+and\s+").expect("bibtex author split regex is valid") // Static pattern, safe to panic
});

/// Type, key and fields of one BibTeX entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexFields {
    entry_type: String,
    key: String,
    fields: Vec<(String, String)>,
}

impl BibtexFields {
    /// Parses the first `@type{key, field = value, ...}` entry in `text`.
    ///
    /// Field names are lowercased; values lose one level of braces or quotes.
    /// Returns `None` if no well-formed entry is found.
    ///
    /// # Examples
    ///
    /// ```
    /// use depcite_core::citation::BibtexFields;
    ///
    /// let text = " @article{Koster_2012, title={Snakemake}, year=2012, month=aug}";
    /// let entry = BibtexFields::parse(text).unwrap();
    /// assert_eq!(entry.key(), "Koster_2012");
    /// assert_eq!(entry.get("year"), Some("2012"));
    /// assert_eq!(entry.get("month"), Some("aug"));
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let at_pos = text.find('@')?;
        let after_at = &text[at_pos + 1..];
        let brace_pos = after_at.find('{')?;

        let entry_type = after_at[..brace_pos].trim().to_ascii_lowercase();
        if entry_type.is_empty() || !entry_type.chars().all(|c| c.is_ascii_alphabetic()) {
            debug!(%entry_type, "invalid BibTeX entry type");
            return None;
        }

        let body = entry_body(&after_at[brace_pos..])?;
        let (key_raw, fields_raw) = body.split_once(',').unwrap_or((body, ""));
        let key = key_raw.trim();
        if key.is_empty() {
            debug!("BibTeX entry has an empty key");
            return None;
        }

        let fields = match parse_fields(fields_raw) {
            Ok(fields) => fields,
            Err(reason) => {
                debug!(key, %reason, "malformed BibTeX fields");
                return None;
            }
        };

        Some(Self {
            entry_type,
            key: key.to_string(),
            fields,
        })
    }

    /// Lowercased entry type (`misc`, `article`, ...).
    #[must_use]
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    /// Citation key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value of the first field named `name` (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Field names in entry order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// The `author` field split on ` and `.
    #[must_use]
    pub fn authors(&self) -> Vec<String> {
        self.get("author")
            .map(|value| {
                AUTHOR_SPLIT_PATTERN
                    .split(value)
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Returns the text between the opening brace at the start of `input` and its
/// matching closing brace.
fn entry_body(input: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escape = false;

    for (index, ch) in input.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' => escape = true,
            '"' if depth == 1 => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&input[1..index]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_fields(input: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' if depth == 0 => in_quotes = !in_quotes,
            '{' if !in_quotes => depth += 1,
            '}' if !in_quotes => {
                depth = depth
                    .checked_sub(1)
                    .ok_or("closing brace without matching opening brace")?;
            }
            ',' if depth == 0 && !in_quotes => {
                push_segment(&mut pairs, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if in_quotes {
        return Err("unterminated quoted value".to_string());
    }
    push_segment(&mut pairs, &current);

    let mut fields = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Some((name, value_raw)) = pair.split_once('=') else {
            return Err(format!("missing '=' in field segment `{pair}`"));
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err("empty field name".to_string());
        }
        fields.push((name, strip_value(value_raw)));
    }
    Ok(fields)
}

fn push_segment(pairs: &mut Vec<String>, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        pairs.push(segment.to_string());
    }
}

fn strip_value(value: &str) -> String {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .or_else(|| trimmed.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .unwrap_or(trimmed);
    inner.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RESOLVER_BIBTEX: &str = " @article{K_ster_2012, title={Snakemake\u{2014}a scalable bioinformatics workflow engine}, volume={28}, ISSN={1367-4803}, url={http://dx.doi.org/10.1093/bioinformatics/bts480}, DOI={10.1093/bioinformatics/bts480}, number={19}, journal={Bioinformatics}, publisher={Oxford University Press (OUP)}, author={K\u{f6}ster, Johannes and Rahmann, Sven}, year={2012}, month=aug, pages={2520\u{2013}2522} }\n";

    #[test]
    fn test_parse_resolver_output() {
        let entry = BibtexFields::parse(RESOLVER_BIBTEX).unwrap();
        assert_eq!(entry.entry_type(), "article");
        assert_eq!(entry.key(), "K_ster_2012");
        assert_eq!(entry.get("doi"), Some("10.1093/bioinformatics/bts480"));
        assert_eq!(entry.get("DOI"), Some("10.1093/bioinformatics/bts480"));
        assert_eq!(entry.get("month"), Some("aug"));
        assert_eq!(
            entry.authors(),
            ["K\u{f6}ster, Johannes", "Rahmann, Sven"]
        );
    }

    #[test]
    fn test_parse_keeps_field_order() {
        let entry = BibtexFields::parse("@misc{k, b = {2}, a = {1}}").unwrap();
        assert_eq!(entry.field_names().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn test_parse_nested_braces_and_quotes() {
        let entry =
            BibtexFields::parse(r#"@misc{k, title = {The {GNU} Tools, vol 2}, note = "a, b"}"#)
                .unwrap();
        assert_eq!(entry.get("title"), Some("The {GNU} Tools, vol 2"));
        assert_eq!(entry.get("note"), Some("a, b"));
    }

    #[test]
    fn test_parse_entry_without_fields() {
        let entry = BibtexFields::parse("@misc{lonely}").unwrap();
        assert_eq!(entry.key(), "lonely");
        assert_eq!(entry.get("title"), None);
        assert!(entry.authors().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BibtexFields::parse("no entry here").is_none());
        assert!(BibtexFields::parse("@misc{unclosed, title = {x}").is_none());
        assert!(BibtexFields::parse("@misc{, title = {x}}").is_none());
        assert!(BibtexFields::parse("@misc{k, title}").is_none());
        assert!(BibtexFields::parse("<html>@ 2x{}</html>").is_none());
    }
}
