//! Reconstruction of numbered entries from the raw reversed line stream.

use once_cell::sync::Lazy;
use regex::Regex;

static ENTRY_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]").unwrap());

/// Merge the raw bottom-to-top line list into forward-order entries.
///
/// Iterating the raw list in reverse restores document order. A line
/// starting with a `[n]` marker opens a new entry; any other line is a
/// continuation of the most recently opened entry, space-joined. A
/// continuation seen before any entry has started has nothing to attach to
/// and is dropped. Gaps in the numbering are accepted, not repaired.
pub fn merge_raw_lines(raw: &[String]) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for line in raw.iter().rev() {
        if ENTRY_START.is_match(line) {
            entries.push(line.clone());
        } else if let Some(current) = entries.last_mut() {
            current.push(' ');
            current.push_str(line);
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn restores_citation_order() {
        let merged = merge_raw_lines(&raw(&["[2] Title B. Venue.", "[1] Author A."]));
        assert_eq!(merged, vec!["[1] Author A.", "[2] Title B. Venue."]);
    }

    #[test]
    fn attaches_continuation_lines_in_encounter_order() {
        // Document order: "[1] Author A," / "continued title," / "and venue."
        let merged = merge_raw_lines(&raw(&[
            "and venue.",
            "continued title,",
            "[1] Author A,",
        ]));
        assert_eq!(merged, vec!["[1] Author A, continued title, and venue."]);
    }

    #[test]
    fn continuation_before_first_entry_is_dropped() {
        let merged = merge_raw_lines(&raw(&["[1] Entry.", "stray heading remnant"]));
        assert_eq!(merged, vec!["[1] Entry."]);
    }

    #[test]
    fn numbering_gaps_are_kept() {
        let merged = merge_raw_lines(&raw(&["[7] Late.", "[3] Early."]));
        assert_eq!(merged, vec!["[3] Early.", "[7] Late."]);
    }

    #[test]
    fn empty_input_merges_to_nothing() {
        assert!(merge_raw_lines(&[]).is_empty());
        assert!(merge_raw_lines(&raw(&["no markers here", "at all"])).is_empty());
    }
}
