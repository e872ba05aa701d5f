//! Deterministic artifact names. All of them derive from the store label and
//! the run date, so two runs on the same date target the same paths.

use chrono::NaiveDate;

use crate::sanitize::sanitize_file_component;

/// `M-D-YYYY` without zero padding, e.g. `3-7-2026`.
pub fn format_run_date(date: NaiveDate) -> String {
    date.format("%-m-%-d-%Y").to_string()
}

/// Parses the `M-D-YYYY` form produced by [`format_run_date`].
pub fn parse_run_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%m-%d-%Y").ok()
}

pub fn vendor_pdf_name(label: &str, date: &str, vendor: &str) -> String {
    format!(
        "{} {} order page 1 {}.pdf",
        label,
        date,
        sanitize_file_component(vendor)
    )
}

pub fn zip_name(label: &str, date: &str) -> String {
    format!("{} {}.zip", label, date)
}

pub fn summary_report_name(label: &str, date: &str) -> String {
    format!("{} {} summary report.csv", label, date)
}
