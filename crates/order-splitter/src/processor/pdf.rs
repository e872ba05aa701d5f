use std::collections::BTreeSet;
use std::path::Path;

use lopdf::Document;

use crate::error::PdfParseError;

/// A loaded orders document with its pages in document order.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    document: Document,
    /// lopdf page numbers (1-based), ascending.
    page_numbers: Vec<u32>,
}

impl SourceDocument {
    pub fn load_mem(bytes: &[u8]) -> Result<Self, PdfParseError> {
        let _span = tracing::info_span!("processor.pdf", bytes = bytes.len()).entered();

        let document = Document::load_mem(bytes).map_err(|e| PdfParseError::Load(e.to_string()))?;
        let page_numbers = document.get_pages().into_keys().collect();

        Ok(Self {
            document,
            page_numbers,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PdfParseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PdfParseError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::load_mem(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    /// Extracted text of the page at `page_index` (0-based).
    ///
    /// Extraction is best-effort: image-only pages or fonts lopdf cannot
    /// decode yield empty or partial text rather than an error.
    pub fn page_text(&self, page_index: usize) -> String {
        let Some(&page_number) = self.page_numbers.get(page_index) else {
            return String::new();
        };
        match self.document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(page = page_index + 1, "Text extraction failed: {}", e);
                String::new()
            }
        }
    }

    /// Serializes a new PDF holding only the given pages (0-based indices),
    /// in document order. Repeated indices are ignored.
    pub fn extract_pages(&self, page_indices: &[usize]) -> Result<Vec<u8>, PdfParseError> {
        let keep: BTreeSet<u32> = page_indices
            .iter()
            .map(|&i| {
                self.page_numbers.get(i).copied().ok_or_else(|| {
                    PdfParseError::Extract(format!(
                        "page index {} out of range ({} pages)",
                        i,
                        self.page_count()
                    ))
                })
            })
            .collect::<Result<_, _>>()?;

        if keep.is_empty() {
            return Err(PdfParseError::Extract("no pages selected".to_string()));
        }

        let drop: Vec<u32> = self
            .page_numbers
            .iter()
            .copied()
            .filter(|n| !keep.contains(n))
            .collect();

        let mut subset = self.document.clone();
        if !drop.is_empty() {
            subset.delete_pages(&drop);
            subset.prune_objects();
        }

        let mut bytes = Vec::new();
        subset
            .save_to(&mut bytes)
            .map_err(|e| PdfParseError::Extract(format!("Failed to serialize PDF: {}", e)))?;
        Ok(bytes)
    }
}
