use std::path::Path;

use thiserror::Error;

pub mod merge;
pub mod normalize;
pub mod section;

// Re-export domain types from core (canonical definitions live there)
pub use bibfetch_core::{LayoutElement, Page, PageSource, Reference, SourceError};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("references section not found")]
    ReferencesNotFound,
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Extract the numbered reference list from a document.
///
/// Pipeline:
/// 1. Materialize pages via `source` and scan them last page first
/// 2. Collect raw lines until the "References" heading stops the scan
/// 3. Merge wrapped lines back into bracket-numbered entries
/// 4. Strip trailing page/volume locants from each entry
///
/// The heading never being found, or a merge producing no entries, is the
/// normal "this document has no usable reference list" outcome and surfaces
/// as [`ParseError::ReferencesNotFound`].
pub fn extract_references(
    path: &Path,
    source: &dyn PageSource,
) -> Result<Vec<Reference>, ParseError> {
    let mut pages = source.pages(path)?;
    pages.reverse();

    let raw = section::collect_raw_lines(&pages);
    let merged = merge::merge_raw_lines(&raw);
    if merged.is_empty() {
        return Err(ParseError::ReferencesNotFound);
    }
    tracing::debug!(path = %path.display(), entries = merged.len(), "extracted references");

    Ok(merged
        .iter()
        .map(|entry| normalize::normalize_entry(entry))
        .filter_map(Reference::parse)
        .collect())
}
