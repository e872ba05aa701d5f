use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::audit::lock::AuditLock;
use crate::error::StorageError;
use crate::storage::filesystem::{ensure_directory, move_file, sibling_temp_path};

pub const STATUS_PREPARED: &str = "Prepared";

/// One row of the per-run summary and of the cumulative audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "Store")]
    pub store: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Pages")]
    pub pages: usize,
    #[serde(rename = "PDF")]
    pub pdf_filename: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl SummaryRecord {
    pub fn prepared(store: &str, vendor: &str, pages: usize, pdf_filename: &str) -> Self {
        Self {
            store: store.to_string(),
            vendor: vendor.to_string(),
            pages,
            pdf_filename: pdf_filename.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            status: STATUS_PREPARED.to_string(),
        }
    }
}

pub const SUMMARY_COLUMNS: [&str; 6] = ["Store", "Vendor", "Pages", "PDF", "Timestamp", "Status"];

impl SummaryRecord {
    fn fields(&self) -> [String; 6] {
        [
            self.store.clone(),
            self.vendor.clone(),
            self.pages.to_string(),
            self.pdf_filename.clone(),
            self.timestamp.clone(),
            self.status.clone(),
        ]
    }
}

/// Renders records as CSV with the summary header. A header is written even
/// when `records` is empty.
pub fn render_summary_csv(records: &[SummaryRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SUMMARY_COLUMNS)?;
    for record in records {
        writer.write_record(record.fields())?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn read_summary_csv(path: &Path) -> Result<Vec<SummaryRecord>, StorageError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| StorageError::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<SummaryRecord>, _>>()
        .map_err(|e| StorageError::Csv {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Appends `records` to the cumulative audit CSV at `path`.
///
/// The existing file is read, the new rows are concatenated and the whole
/// table is rewritten through a temp file. Columns are aligned by name, so an
/// older log with extra or reordered columns keeps them. The read-modify-write
/// runs under [`AuditLock`].
pub fn append_audit_log(
    path: &Path,
    records: &[SummaryRecord],
    lock_timeout: Duration,
) -> Result<usize, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let _lock = AuditLock::acquire(path, lock_timeout)?;
    let csv_error = |source: csv::Error| StorageError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let (mut header, mut rows) = if path.exists() {
        read_table(path).map_err(csv_error)?
    } else {
        (Vec::new(), Vec::new())
    };

    for column in SUMMARY_COLUMNS {
        if !header.iter().any(|h| h == column) {
            header.push(column.to_string());
        }
    }
    let position: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    for row in rows.iter_mut() {
        row.resize(header.len(), String::new());
    }
    for record in records {
        let mut row = vec![String::new(); header.len()];
        for (column, value) in SUMMARY_COLUMNS.iter().zip(record.fields()) {
            row[position[column]] = value;
        }
        rows.push(row);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header).map_err(csv_error)?;
    for row in &rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv_error(csv::Error::from(e.into_error())))?;

    let temp_path = sibling_temp_path(path);
    std::fs::write(&temp_path, bytes).map_err(|e| StorageError::WriteFile {
        path: temp_path.clone(),
        source: e,
    })?;
    if let Err(e) = move_file(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(rows.len())
}

fn read_table(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let header = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(|v| v.to_string()).collect());
    }
    Ok((header, rows))
}
