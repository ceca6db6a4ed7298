use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

pub mod cache;
pub mod config_file;
pub mod keys;
pub mod pool;
pub mod resolver;
pub mod search;
pub mod source;

// Re-export for convenience
pub use cache::DocumentCache;
pub use pool::{BibJob, ResolvePool, resolve_references};
pub use search::{SearchReply, SearchService, dblp::DblpSearch};
pub use source::{LayoutElement, Page, PageSource, SourceError};

/// One normalized citation entry parsed out of a document's reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The bracketed citation numeral.
    pub number: u32,
    /// Full entry text, including the leading `[n]` marker.
    pub text: String,
}

static ENTRY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d+)\]").unwrap());

impl Reference {
    /// Parse an entry of the form `"[n] ..."`. Returns `None` when the
    /// marker is missing or its numeral does not fit a `u32`.
    pub fn parse(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let number = ENTRY_MARKER
            .captures(&text)?
            .get(1)?
            .as_str()
            .parse()
            .ok()?;
        Some(Self { number, text })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The resolved record for one citation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BibResult {
    /// Non-empty record text returned by the search service.
    Found(String),
    /// The degradation loop reached its token floor with no match.
    NotFound,
    /// The last reply before the floor carried this non-200 status.
    ServerError(u16),
}

impl BibResult {
    pub fn outcome(&self) -> Outcome {
        match self {
            BibResult::Found(_) => Outcome::Found,
            BibResult::NotFound => Outcome::NotFound,
            BibResult::ServerError(_) => Outcome::ServerError,
        }
    }
}

impl fmt::Display for BibResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BibResult::Found(text) => f.write_str(text),
            BibResult::NotFound => f.write_str("None"),
            BibResult::ServerError(status) => write!(f, "Server Error! Code: {status}"),
        }
    }
}

/// Coarse classification of a [`BibResult`], used in progress events and
/// summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    NotFound,
    ServerError,
}

/// The resolved bibliography for one document, in citation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    pub entries: Vec<(Reference, BibResult)>,
}

impl Bibliography {
    /// Serialize to the `"<entry>\n<result>\n"` block format, one block per
    /// citation, in citation order. This is the unit the document cache
    /// stores and the save operation writes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (reference, result) in &self.entries {
            out.push_str(&reference.text);
            out.push('\n');
            out.push_str(&result.to_string());
            out.push('\n');
        }
        out
    }

    pub fn stats(&self) -> BibStats {
        let mut stats = BibStats {
            total: self.entries.len(),
            ..BibStats::default()
        };
        for (_, result) in &self.entries {
            match result.outcome() {
                Outcome::Found => stats.found += 1,
                Outcome::NotFound => stats.not_found += 1,
                Outcome::ServerError => stats.server_errors += 1,
            }
        }
        stats
    }
}

/// Summary counts for one resolved bibliography.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BibStats {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub server_errors: usize,
}

/// Progress events emitted while a batch resolves.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Resolving {
        index: usize,
        total: usize,
        number: u32,
    },
    Resolved {
        index: usize,
        total: usize,
        number: u32,
        outcome: Outcome,
    },
}

/// Configuration for reference resolution.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the publication search endpoint.
    pub api_base: String,
    /// Maximum hits requested per query (the endpoint's `h` parameter).
    pub max_hits: u32,
    /// Record format requested from the endpoint (`format` parameter).
    pub record_format: String,
    /// Worker pool size; bounds outbound request concurrency regardless of
    /// reference list length.
    pub num_workers: usize,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// Immediate retries for a non-200 reply before the current narrowing
    /// step gives up.
    pub max_retries: u32,
    /// Each narrowing step drops `max(1, words / narrow_divisor)` words.
    pub narrow_divisor: usize,
    /// Narrowing stops once fewer than this many words remain.
    pub min_query_tokens: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://dblp.org/search/publ/api".into(),
            max_hits: 5,
            record_format: "bib1".into(),
            num_workers: 16,
            http_timeout_secs: 10,
            max_retries: 3,
            narrow_divisor: 10,
            min_query_tokens: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_parse_extracts_number() {
        let reference = Reference::parse("[12] A. Author. Some Title.").unwrap();
        assert_eq!(reference.number, 12);
        assert_eq!(reference.text, "[12] A. Author. Some Title.");
    }

    #[test]
    fn reference_parse_rejects_missing_marker() {
        assert!(Reference::parse("A. Author. Some Title.").is_none());
        assert!(Reference::parse("").is_none());
        assert!(Reference::parse("[x] not a numeral").is_none());
    }

    #[test]
    fn bib_result_display() {
        assert_eq!(BibResult::Found("@article{x}".into()).to_string(), "@article{x}");
        assert_eq!(BibResult::NotFound.to_string(), "None");
        assert_eq!(
            BibResult::ServerError(503).to_string(),
            "Server Error! Code: 503"
        );
    }

    #[test]
    fn bibliography_renders_blocks_in_order() {
        let bib = Bibliography {
            entries: vec![
                (
                    Reference::parse("[1] First.").unwrap(),
                    BibResult::Found("@misc{a}".into()),
                ),
                (Reference::parse("[2] Second.").unwrap(), BibResult::NotFound),
            ],
        };
        assert_eq!(bib.render(), "[1] First.\n@misc{a}\n[2] Second.\nNone\n");
    }

    #[test]
    fn bibliography_stats_counts_outcomes() {
        let bib = Bibliography {
            entries: vec![
                (
                    Reference::parse("[1] A.").unwrap(),
                    BibResult::Found("@misc{a}".into()),
                ),
                (Reference::parse("[2] B.").unwrap(), BibResult::NotFound),
                (Reference::parse("[3] C.").unwrap(), BibResult::ServerError(500)),
            ],
        };
        let stats = bib.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.found, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.server_errors, 1);
    }
}
