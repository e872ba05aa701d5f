use regex::{RegexSet, RegexSetBuilder};

use crate::mapping::{MappingTable, SkuRecord};

/// Upper bound for the compiled SKU set. Larger mappings use the linear scan.
const REGEX_SET_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Finds the first SKU, in mapping order, that occurs literally in a page.
///
/// All SKUs are compiled once into a `RegexSet` of escaped literals so each
/// page is scanned in a single pass. The set reports every pattern that
/// matches and the lowest index is the earliest SKU in the mapping, which
/// keeps first-match-wins independent of where the SKU sits in the text.
pub struct SkuMatcher<'a> {
    records: &'a [SkuRecord],
    set: Option<RegexSet>,
}

impl<'a> SkuMatcher<'a> {
    pub fn new(mapping: &'a MappingTable) -> Self {
        let records = mapping.records();
        let set = if records.is_empty() {
            None
        } else {
            let patterns = records.iter().map(|r| regex::escape(&r.sku));
            match RegexSetBuilder::new(patterns)
                .size_limit(REGEX_SET_SIZE_LIMIT)
                .build()
            {
                Ok(set) => Some(set),
                Err(e) => {
                    tracing::warn!(
                        skus = records.len(),
                        "Falling back to linear SKU scan: {}",
                        e
                    );
                    None
                }
            }
        };

        Self { records, set }
    }

    pub fn first_match(&self, text: &str) -> Option<&'a SkuRecord> {
        match &self.set {
            Some(set) => set
                .matches(text)
                .iter()
                .next()
                .map(|index| &self.records[index]),
            None => self.linear_match(text),
        }
    }

    fn linear_match(&self, text: &str) -> Option<&'a SkuRecord> {
        self.records.iter().find(|r| text.contains(r.sku.as_str()))
    }
}
