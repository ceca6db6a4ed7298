use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open document: {0}")]
    Open(String),
    #[error("failed to extract page text: {0}")]
    Extraction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One layout element discovered on a page.
///
/// Only text-bearing elements participate in reference extraction; figures,
/// rules, and other furniture come through as [`LayoutElement::NonText`] so
/// that element positions within a page stay meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutElement {
    Text(String),
    NonText,
}

impl LayoutElement {
    pub fn text(&self) -> Option<&str> {
        match self {
            LayoutElement::Text(text) => Some(text),
            LayoutElement::NonText => None,
        }
    }
}

/// One page's layout elements, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub elements: Vec<LayoutElement>,
}

/// Trait for page-layout text sources.
///
/// Implementors provide the low-level page/element stream; the extraction
/// pipeline (reverse section scan, entry merging, normalization) lives in
/// `bibfetch-parsing`. Pages come back in document order; callers reverse
/// them for the bottom-up scan.
pub trait PageSource: Send + Sync {
    fn pages(&self, path: &Path) -> Result<Vec<Page>, SourceError>;
}
