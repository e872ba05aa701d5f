//! SKU → vendor lookup table built from the uploaded mapping sheet.

pub mod columns;
pub mod sheet;

use std::collections::HashMap;

use tracing::{debug, info_span, warn};

use crate::config::OverwritePolicy;
use crate::error::SchemaError;

pub use columns::{resolve_columns, ColumnSchema};
pub use sheet::{read_sheet, Sheet, SheetFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuRecord {
    pub sku: String,
    pub vendor: String,
    /// Empty when the sheet has no email column or the cell is blank.
    pub email: String,
}

/// Ordered SKU table. Iteration order is the order in which each SKU first
/// appeared in the sheet; classification relies on it for first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    records: Vec<SkuRecord>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from records in order, applying `policy` to repeated SKUs.
    pub fn from_records<I>(records: I, policy: OverwritePolicy) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = SkuRecord>,
    {
        let mut table = Self::new();
        for (row, record) in records.into_iter().enumerate() {
            table.insert(record, row + 1, policy)?;
        }
        Ok(table)
    }

    fn insert(
        &mut self,
        record: SkuRecord,
        row: usize,
        policy: OverwritePolicy,
    ) -> Result<(), SchemaError> {
        match self.index.get(&record.sku) {
            Some(&position) => {
                if policy == OverwritePolicy::FailOnConflict {
                    return Err(SchemaError::DuplicateSku {
                        sku: record.sku,
                        row,
                    });
                }
                // Last row wins but the SKU keeps its first position.
                if !self.duplicates.contains(&record.sku) {
                    self.duplicates.push(record.sku.clone());
                }
                self.records[position] = record;
            }
            None => {
                self.index.insert(record.sku.clone(), self.records.len());
                self.records.push(record);
            }
        }
        Ok(())
    }

    pub fn get(&self, sku: &str) -> Option<&SkuRecord> {
        self.index.get(sku).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkuRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[SkuRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// SKUs that appeared on more than one row and were overwritten.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

/// Loads the mapping sheet with last-write-wins semantics for duplicate SKUs.
pub fn load_mapping(sheet_bytes: &[u8]) -> Result<MappingTable, SchemaError> {
    load_mapping_with(sheet_bytes, OverwritePolicy::LastWriteWins)
}

pub fn load_mapping_with(
    sheet_bytes: &[u8],
    policy: OverwritePolicy,
) -> Result<MappingTable, SchemaError> {
    let format = SheetFormat::detect(sheet_bytes);
    let _span = info_span!("mapping.load", format = ?format).entered();

    let sheet = read_sheet(sheet_bytes)?;
    let schema = resolve_columns(&sheet.headers)?;
    debug!(?schema, rows = sheet.rows.len(), "Resolved mapping columns");

    let mut table = MappingTable::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        // Row numbers as shown in a spreadsheet: header is row 1.
        let row_number = i + 2;
        let sku = sheet::cell(row, schema.sku).trim();
        if sku.is_empty() {
            if row.iter().any(|v| !v.trim().is_empty()) {
                debug!(row = row_number, "Skipping mapping row without SKU");
            }
            continue;
        }

        let record = SkuRecord {
            sku: sku.to_string(),
            vendor: sheet::cell(row, schema.vendor).trim().to_string(),
            email: schema
                .email
                .map(|column| sheet::cell(row, column).trim().to_string())
                .unwrap_or_default(),
        };
        table.insert(record, row_number, policy)?;
    }

    if !table.duplicates().is_empty() {
        warn!(
            count = table.duplicates().len(),
            skus = ?table.duplicates(),
            "Duplicate SKUs in mapping sheet, last row wins"
        );
    }

    Ok(table)
}
