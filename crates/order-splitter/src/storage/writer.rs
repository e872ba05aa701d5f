use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info_span};

use crate::audit::{render_summary_csv, SummaryRecord};
use crate::classifier::VendorBuckets;
use crate::config::OverwritePolicy;
use crate::error::StorageError;
use crate::processor::SourceDocument;
use crate::sanitize;
use crate::storage::archive::build_zip;
use crate::storage::filesystem::FileStorage;
use crate::storage::naming::{format_run_date, summary_report_name, vendor_pdf_name, zip_name};

#[derive(Debug, Clone)]
pub struct WrittenPdf {
    pub vendor: String,
    pub filename: String,
    pub path: PathBuf,
    pub pages: usize,
}

#[derive(Debug, Clone)]
pub struct WriteResult {
    /// `M-D-YYYY` form of the run date.
    pub run_date: String,
    /// `{output_root}/{run_date}`
    pub run_directory: PathBuf,
    pub vendor_pdfs: Vec<WrittenPdf>,
    pub zip_path: PathBuf,
    pub summary_records: Vec<SummaryRecord>,
}

/// Serializes vendor buckets into per-vendor PDFs and the run's zip bundle.
pub struct ArtifactWriter {
    storage: FileStorage,
    label: String,
}

impl ArtifactWriter {
    pub fn new<P: AsRef<Path>>(output_root: P, label: &str, policy: OverwritePolicy) -> Self {
        Self {
            storage: FileStorage::new(output_root, policy),
            label: label.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn run_directory(&self, run_date: NaiveDate) -> PathBuf {
        self.storage
            .output_directory()
            .join(format_run_date(run_date))
    }

    /// Writes one PDF per bucket, then the zip of all of them.
    ///
    /// The zip is only written after every vendor PDF succeeded. On failure
    /// the vendor PDFs written so far stay on disk and the error is returned.
    pub fn write_artifacts(
        &self,
        document: &SourceDocument,
        buckets: &VendorBuckets,
        run_date: NaiveDate,
    ) -> Result<WriteResult, StorageError> {
        let date = format_run_date(run_date);
        let _span = info_span!("storage.write_artifacts", run_date = %date, vendors = buckets.len())
            .entered();

        let vendor_directory = format!("{}/{}", date, self.label);
        let mut used_names = HashSet::new();
        let mut vendor_pdfs = Vec::with_capacity(buckets.len());
        let mut contents = Vec::with_capacity(buckets.len());
        let mut summary_records = Vec::with_capacity(buckets.len());

        for bucket in buckets.iter() {
            let bytes =
                document
                    .extract_pages(&bucket.pages)
                    .map_err(|source| StorageError::RenderPdf {
                        vendor: bucket.vendor.clone(),
                        source,
                    })?;

            let filename = unique_name(
                vendor_pdf_name(&self.label, &date, &bucket.vendor),
                &mut used_names,
            );
            let path = self.storage.store(&bytes, &vendor_directory, &filename)?;
            debug!(
                vendor = %bucket.vendor,
                pages = bucket.count(),
                file = %sanitize::redact_path(&path),
                "Wrote vendor PDF"
            );

            summary_records.push(SummaryRecord::prepared(
                &self.label,
                &bucket.vendor,
                bucket.count(),
                &filename,
            ));
            vendor_pdfs.push(WrittenPdf {
                vendor: bucket.vendor.clone(),
                filename: filename.clone(),
                path,
                pages: bucket.count(),
            });
            contents.push((filename, bytes));
        }

        let zip_filename = zip_name(&self.label, &date);
        let zip_bytes = build_zip(
            contents
                .iter()
                .map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
            &self.run_directory(run_date).join(&zip_filename),
        )?;
        let zip_path = self.storage.store_atomic(&zip_bytes, &date, &zip_filename)?;
        debug!(entries = contents.len(), "Wrote zip bundle");

        Ok(WriteResult {
            run_date: date,
            run_directory: self.run_directory(run_date),
            vendor_pdfs,
            zip_path,
            summary_records,
        })
    }

    /// Writes the per-run summary CSV next to the zip. Re-runs on the same
    /// date replace it unless the policy is fail-on-conflict.
    pub fn write_summary(
        &self,
        run_date: NaiveDate,
        records: &[SummaryRecord],
    ) -> Result<PathBuf, StorageError> {
        let date = format_run_date(run_date);
        let filename = summary_report_name(&self.label, &date);
        let target = self.run_directory(run_date).join(&filename);

        let bytes = render_summary_csv(records).map_err(|source| StorageError::Csv {
            path: target.clone(),
            source,
        })?;
        self.storage.store_atomic(&bytes, &date, &filename)
    }
}

/// Distinct vendors can sanitize to the same file name (`A/B` and `A_B`).
/// Later ones get a numeric suffix so the zip never holds duplicate entries.
fn unique_name(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }

    let (base, ext) = match candidate.rfind('.') {
        Some(dot) => (&candidate[..dot], &candidate[dot..]),
        None => (candidate.as_str(), ""),
    };
    let mut counter = 2;
    loop {
        let name = format!("{}_{}{}", base, counter, ext);
        if used.insert(name.clone()) {
            return name;
        }
        counter += 1;
    }
}

/// Writes the vendor PDFs and zip for `buckets` under `output_root`,
/// replacing artifacts from an earlier run on the same date.
pub fn write_artifacts(
    document: &SourceDocument,
    buckets: &VendorBuckets,
    run_date: NaiveDate,
    output_root: &Path,
    label: &str,
) -> Result<WriteResult, StorageError> {
    ArtifactWriter::new(output_root, label, OverwritePolicy::LastWriteWins)
        .write_artifacts(document, buckets, run_date)
}
