use std::path::PathBuf;

use chrono::NaiveDate;

use crate::classifier::Classification;
use crate::mapping::MappingTable;
use crate::storage::WriteResult;

use super::error::RunWarning;

/// State of a single invocation. Nothing outlives the run.
pub struct RunContext {
    // Input
    pub run_date: NaiveDate,

    // Step 1 result, guaranteed Some after step_load_mapping
    pub mapping: Option<MappingTable>,

    // Step 2 result, guaranteed Some after step_classify
    pub classification: Option<Classification>,

    // Step 3 result
    pub written: Option<WriteResult>,

    // Step 4 result
    pub summary_path: Option<PathBuf>,

    // Step 5 result: total rows in the audit log after the append
    pub audit_rows: Option<usize>,

    // Step 6 result, Some only when there were errors to record
    pub error_log_path: Option<PathBuf>,

    // Non-fatal warnings
    pub warnings: Vec<RunWarning>,
}

impl RunContext {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            mapping: None,
            classification: None,
            written: None,
            summary_path: None,
            audit_rows: None,
            error_log_path: None,
            warnings: Vec::new(),
        }
    }
}
