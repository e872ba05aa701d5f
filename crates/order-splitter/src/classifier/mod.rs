//! Assigns every page of the orders document to a vendor bucket or to the
//! unmatched list.

pub mod matcher;

use std::collections::HashMap;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info_span};

use crate::error::PdfParseError;
use crate::mapping::MappingTable;
use crate::processor::SourceDocument;

pub use matcher::SkuMatcher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageClassification {
    /// 0-based position in the source document.
    pub page_index: usize,
    pub matched_vendor: Option<String>,
    pub matched_sku: Option<String>,
}

impl PageClassification {
    pub fn is_matched(&self) -> bool {
        self.matched_vendor.is_some()
    }
}

/// Pages attributed to one vendor, in source document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorBucket {
    pub vendor: String,
    pub pages: Vec<usize>,
}

impl VendorBucket {
    fn new(vendor: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            pages: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.pages.len()
    }
}

/// Vendor buckets in the order each vendor first matched.
#[derive(Debug, Clone, Default)]
pub struct VendorBuckets {
    buckets: Vec<VendorBucket>,
    index: HashMap<String, usize>,
}

impl VendorBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page to the vendor's bucket, creating the bucket on first use.
    pub fn push(&mut self, vendor: &str, page_index: usize) {
        let position = match self.index.get(vendor) {
            Some(&position) => position,
            None => {
                self.buckets.push(VendorBucket::new(vendor));
                self.index.insert(vendor.to_string(), self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        self.buckets[position].pages.push(page_index);
    }

    pub fn get(&self, vendor: &str) -> Option<&VendorBucket> {
        self.index.get(vendor).map(|&i| &self.buckets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &VendorBucket> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_pages(&self) -> usize {
        self.buckets.iter().map(VendorBucket::count).sum()
    }
}

/// A non-fatal problem recorded during a run, written to the error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub timestamp: String,
    pub message: String,
}

impl ErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            message: message.into(),
        }
    }

    pub fn unmatched_page(page_index: usize) -> Self {
        Self::new(format!("Page {}: No matching SKU.", page_index + 1))
    }

    /// Line format of the persistent error log.
    pub fn to_log_line(&self) -> String {
        format!("{} - {}", self.timestamp, self.message)
    }
}

pub struct Classification {
    pub document: SourceDocument,
    pub pages: Vec<PageClassification>,
    pub buckets: VendorBuckets,
    pub errors: Vec<ErrorEntry>,
}

impl Classification {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.pages.iter().filter(|p| !p.is_matched()).count()
    }
}

/// Parses `pdf_bytes` and classifies every page against `mapping`.
pub fn classify(pdf_bytes: &[u8], mapping: &MappingTable) -> Result<Classification, PdfParseError> {
    let document = SourceDocument::load_mem(pdf_bytes)?;
    Ok(classify_document(document, mapping))
}

pub fn classify_document(document: SourceDocument, mapping: &MappingTable) -> Classification {
    let _span = info_span!(
        "classifier.classify",
        pages = document.page_count(),
        skus = mapping.len()
    )
    .entered();

    let matcher = SkuMatcher::new(mapping);
    let mut pages = Vec::with_capacity(document.page_count());
    let mut buckets = VendorBuckets::new();
    let mut errors = Vec::new();

    for page_index in 0..document.page_count() {
        let text = document.page_text(page_index);
        match matcher.first_match(&text) {
            Some(record) => {
                debug!(
                    page = page_index + 1,
                    sku = %record.sku,
                    vendor = %record.vendor,
                    "Page matched"
                );
                buckets.push(&record.vendor, page_index);
                pages.push(PageClassification {
                    page_index,
                    matched_vendor: Some(record.vendor.clone()),
                    matched_sku: Some(record.sku.clone()),
                });
            }
            None => {
                debug!(page = page_index + 1, "No matching SKU");
                errors.push(ErrorEntry::unmatched_page(page_index));
                pages.push(PageClassification {
                    page_index,
                    matched_vendor: None,
                    matched_sku: None,
                });
            }
        }
    }

    Classification {
        document,
        pages,
        buckets,
        errors,
    }
}
