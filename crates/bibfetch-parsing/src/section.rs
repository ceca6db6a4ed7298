//! Reverse scan for the references section.
//!
//! The bibliography sits at the end of a paper, so the scan walks pages
//! last to first and, within a page, text elements in reverse discovery
//! order, accumulating lines until the section heading is met. Everything
//! gathered before the heading is the raw reference material, in
//! bottom-to-top order; the merger restores document order.

use once_cell::sync::Lazy;
use regex::Regex;

use bibfetch_core::{LayoutElement, Page};

/// The heading must start the element and sit on its own line.
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^references\n").unwrap());

/// Collect the raw trimmed lines lying between the document end and the
/// "References" heading.
///
/// `pages` must already be in reverse document order (last page first).
/// Returns lines bottom-to-top; an empty result means the heading was never
/// found or nothing followed it.
pub fn collect_raw_lines(pages: &[Page]) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();

    for page in pages {
        let texts: Vec<&str> = page
            .elements
            .iter()
            .filter_map(LayoutElement::text)
            .collect();
        if texts.is_empty() {
            continue;
        }

        // The last text element of a page is a layout artifact (page
        // furniture); skip it and walk the rest in reverse.
        for text in texts[..texts.len() - 1].iter().rev() {
            if HEADING.is_match(text) {
                return raw;
            }
            for line in element_lines(text) {
                raw.push(line);
            }
        }
    }

    tracing::debug!(lines = raw.len(), "section heading not found");
    raw
}

/// Split one element's text into trimmed lines, last physical line first,
/// rejoining words split by soft line-break hyphenation (`"exam-\nple"` →
/// `"example"`).
fn element_lines(text: &str) -> Vec<String> {
    text.trim_matches(|c| c == '\n' || c == ' ')
        .replace("-\n", "")
        .split('\n')
        .rev()
        .map(|line| line.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(elements: Vec<LayoutElement>) -> Page {
        Page { elements }
    }

    fn text(s: &str) -> LayoutElement {
        LayoutElement::Text(s.to_string())
    }

    #[test]
    fn stops_at_heading_and_excludes_it() {
        // One page, reverse scan order: artifact last, then entries, then
        // heading, then body text that must never be reached.
        let pages = vec![page(vec![
            text("Earlier body text.\n"),
            text("References\n"),
            text("[1] Author A.\n"),
            text("[2] Title B. Venue.\n"),
            text("page footer\n"),
        ])];

        let raw = collect_raw_lines(&pages);
        assert_eq!(raw, vec!["[2] Title B. Venue.", "[1] Author A."]);
    }

    #[test]
    fn heading_match_is_case_insensitive() {
        let pages = vec![page(vec![
            text("REFERENCES\n"),
            text("[1] Entry.\n"),
            text("artifact\n"),
        ])];

        assert_eq!(collect_raw_lines(&pages), vec!["[1] Entry."]);
    }

    #[test]
    fn heading_must_start_the_element() {
        let pages = vec![page(vec![
            text("References\n"),
            text("see References\nfor details\n"),
            text("artifact\n"),
        ])];

        // The mid-text mention does not stop the scan; the real heading does.
        assert_eq!(
            collect_raw_lines(&pages),
            vec!["for details", "see References"]
        );
    }

    #[test]
    fn heading_requires_its_own_line() {
        let pages = vec![page(vec![
            text("References\n"),
            text("References and further reading\n"),
            text("artifact\n"),
        ])];

        assert_eq!(
            collect_raw_lines(&pages),
            vec!["References and further reading"]
        );
    }

    #[test]
    fn lines_within_an_element_come_out_reversed_and_trimmed() {
        let pages = vec![page(vec![
            text("References\n"),
            text("  [1] First line.\n[2] Second\nline continues.  \n"),
            text("artifact\n"),
        ])];

        assert_eq!(
            collect_raw_lines(&pages),
            vec!["line continues.", "[2] Second", "[1] First line."]
        );
    }

    #[test]
    fn soft_hyphenation_is_rejoined() {
        let pages = vec![page(vec![
            text("References\n"),
            text("[1] A distrib-\nuted system.\n"),
            text("artifact\n"),
        ])];

        assert_eq!(collect_raw_lines(&pages), vec!["[1] A distributed system."]);
    }

    #[test]
    fn last_element_per_page_is_skipped() {
        let pages = vec![page(vec![
            text("References\n"),
            text("[1] Real entry.\n"),
            text("Conference Proceedings Page 7\n"),
        ])];

        let raw = collect_raw_lines(&pages);
        assert!(raw.iter().all(|line| !line.contains("Page 7")));
        assert_eq!(raw, vec!["[1] Real entry."]);
    }

    #[test]
    fn non_text_elements_are_ignored() {
        let pages = vec![page(vec![
            text("References\n"),
            LayoutElement::NonText,
            text("[1] Entry.\n"),
            LayoutElement::NonText,
            text("artifact\n"),
        ])];

        assert_eq!(collect_raw_lines(&pages), vec!["[1] Entry."]);
    }

    #[test]
    fn scan_spans_multiple_pages() {
        // Reverse page order: last page first.
        let pages = vec![
            page(vec![
                text("[3] Third entry, on the last page.\n"),
                text("artifact\n"),
            ]),
            page(vec![
                text("References\n"),
                text("[1] First entry.\n"),
                text("[2] Second entry.\n"),
                text("artifact\n"),
            ]),
        ];

        assert_eq!(
            collect_raw_lines(&pages),
            vec![
                "[3] Third entry, on the last page.",
                "[2] Second entry.",
                "[1] First entry.",
            ]
        );
    }

    #[test]
    fn missing_heading_returns_accumulated_lines() {
        let pages = vec![page(vec![
            text("Some text.\n"),
            text("More text.\n"),
            text("artifact\n"),
        ])];

        // No heading: everything scanned comes back; the merger decides
        // whether anything usable is in it.
        assert_eq!(collect_raw_lines(&pages), vec!["More text.", "Some text."]);
    }

    #[test]
    fn pages_with_no_text_are_skipped() {
        let pages = vec![
            page(vec![LayoutElement::NonText]),
            page(vec![
                text("References\n"),
                text("[1] Entry.\n"),
                text("artifact\n"),
            ]),
        ];

        assert_eq!(collect_raw_lines(&pages), vec!["[1] Entry."]);
    }
}
