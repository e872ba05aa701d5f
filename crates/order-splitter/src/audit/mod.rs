//! Persistent run records: per-run summary CSV, cumulative audit CSV and the
//! plain-text error log.

pub mod error_log;
pub mod lock;
pub mod summary;

pub use error_log::append_error_log;
pub use lock::AuditLock;
pub use summary::{
    append_audit_log, read_summary_csv, render_summary_csv, SummaryRecord, STATUS_PREPARED,
    SUMMARY_COLUMNS,
};

pub const AUDIT_LOG_FILENAME: &str = "sent_orders_log.csv";
pub const ERROR_LOG_FILENAME: &str = "error_log.txt";
