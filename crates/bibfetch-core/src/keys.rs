//! Search-key extraction from a normalized citation entry.
//!
//! An entry is tokenized on its period-separated segments; runs of
//! single-letter segments (author initials) are folded back into one token
//! so the author list stays a single key. Token order is load-bearing: the
//! resolver degrades queries from the tail, so most-specific material
//! (authors, then title) must come first.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]").unwrap());

/// Extract the ordered query-key list for one entry.
///
/// Strips the leading `[n]` marker, trims surrounding spaces and periods,
/// splits on periods, trims each segment, and drops empty segments.
pub fn citation_keys(entry: &str) -> Vec<String> {
    let body = MARKER.replace(entry, "");
    let segments: Vec<&str> = body
        .trim_matches(|c: char| c == ' ' || c == '.')
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut keys: Vec<String> = Vec::with_capacity(segments.len());
    let mut initials: Vec<&str> = Vec::new();
    for segment in segments {
        if segment.chars().count() == 1 {
            initials.push(segment);
            continue;
        }
        if !initials.is_empty() {
            keys.push(initials.join(". "));
            initials.clear();
        }
        keys.push(segment.to_string());
    }
    if !initials.is_empty() {
        keys.push(initials.join(". "));
    }
    keys
}
