use std::path::Path;

use mupdf::{Document, TextPageFlags};

use bibfetch_core::{LayoutElement, Page, PageSource, SourceError};

/// MuPDF-based implementation of [`PageSource`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
///
/// Each text block on a page becomes one [`LayoutElement::Text`] with its
/// lines newline-terminated, preserving block discovery order; blocks with
/// no visible text come through as [`LayoutElement::NonText`] so element
/// positions within the page stay meaningful for the reverse scan.
#[derive(Debug, Default)]
pub struct MupdfSource;

impl MupdfSource {
    pub fn new() -> Self {
        Self
    }
}

impl PageSource for MupdfSource {
    fn pages(&self, path: &Path) -> Result<Vec<Page>, SourceError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| SourceError::Open("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| SourceError::Open(e.to_string()))?;

        let mut pages = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| SourceError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| SourceError::Extraction(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| SourceError::Extraction(e.to_string()))?;

            let mut elements = Vec::new();
            for block in text_page.blocks() {
                let mut text = String::new();
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    text.push_str(&line_text);
                    text.push('\n');
                }
                if text.trim().is_empty() {
                    elements.push(LayoutElement::NonText);
                } else {
                    elements.push(LayoutElement::Text(text));
                }
            }
            pages.push(Page { elements });
        }

        Ok(pages)
    }
}
