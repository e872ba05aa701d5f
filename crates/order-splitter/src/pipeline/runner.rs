use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info_span, warn};

use crate::audit::{append_audit_log, append_error_log, SummaryRecord};
use crate::classifier::{self, Classification, ErrorEntry};
use crate::mapping::{self, MappingTable};
use crate::sanitize;
use crate::storage::{format_run_date, ArtifactWriter, WriteResult, WrittenPdf};

use super::config::PipelineConfig;
use super::context::RunContext;
use super::error::{PipelineError, RunWarning};
use super::progress::{ProgressEvent, ProgressReporter, RunPhase};

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `M-D-YYYY`
    pub run_date: String,
    pub total_pages: usize,
    pub matched_pages: usize,
    pub vendor_pdfs: Vec<WrittenPdf>,
    pub zip_path: PathBuf,
    pub summary_path: PathBuf,
    pub summary_records: Vec<SummaryRecord>,
    pub audit_log_path: PathBuf,
    /// Rows in the audit log after this run's append.
    pub audit_rows: usize,
    pub errors: Vec<ErrorEntry>,
    pub error_log_path: Option<PathBuf>,
    pub warnings: Vec<RunWarning>,
}

impl RunReport {
    pub fn vendor_count(&self) -> usize {
        self.vendor_pdfs.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Prepared(RunReport),
    /// The document had pages but none matched a SKU. Only the error log was
    /// written.
    NoMatchedPages {
        errors: Vec<ErrorEntry>,
        error_log_path: PathBuf,
    },
    /// The document has no pages. Nothing was written.
    EmptyDocument,
}

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    writer: ArtifactWriter,
}

impl Pipeline {
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        let writer = ArtifactWriter::new(&config.output_root, &config.store_label, config.overwrite);
        Self { config, writer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for one mapping sheet and one orders document.
    pub fn run(
        &self,
        sheet_bytes: &[u8],
        pdf_bytes: &[u8],
        run_date: NaiveDate,
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome, PipelineError> {
        let (result, _ctx) =
            self.run_with_context(RunContext::new(run_date), sheet_bytes, pdf_bytes, progress);
        result
    }

    /// Like [`Pipeline::run`], but hands the context back so callers can
    /// inspect intermediate results even when a later step failed.
    pub fn run_with_context(
        &self,
        mut ctx: RunContext,
        sheet_bytes: &[u8],
        pdf_bytes: &[u8],
        progress: &dyn ProgressReporter,
    ) -> (Result<RunOutcome, PipelineError>, RunContext) {
        let result = self.execute(&mut ctx, sheet_bytes, pdf_bytes, progress);
        if let Err(ref e) = result {
            progress.report(ProgressEvent::Failed {
                error: e.to_string(),
            });
        }
        (result, ctx)
    }

    fn execute(
        &self,
        ctx: &mut RunContext,
        sheet_bytes: &[u8],
        pdf_bytes: &[u8],
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome, PipelineError> {
        let run_date = format_run_date(ctx.run_date);
        let _pipeline_span = info_span!("pipeline",
            run_date = %run_date,
            store = %self.config.store_label,
            output_root = %sanitize::redact_path(&self.config.output_root),
        )
        .entered();

        // Step 1: Load mapping
        let mapping = {
            let _step = info_span!("load_mapping").entered();
            progress.report(ProgressEvent::Phase {
                phase: RunPhase::LoadingMapping,
                message: "Loading SKU mapping...".to_string(),
            });
            self.step_load_mapping(ctx, sheet_bytes)?
        };

        // Step 2: Classify pages
        let classification = {
            let _step = info_span!("classify").entered();
            progress.report(ProgressEvent::Phase {
                phase: RunPhase::Classifying,
                message: format!("Matching pages against {} SKUs...", mapping.len()),
            });
            self.step_classify(ctx, pdf_bytes, &mapping)?
        };
        ctx.mapping = Some(mapping);

        if classification.page_count() == 0 {
            warn!("Orders document has no pages");
            ctx.classification = Some(classification);
            progress.report(ProgressEvent::Completed {
                vendors: 0,
                pages: 0,
                errors: 0,
            });
            return Ok(RunOutcome::EmptyDocument);
        }

        if classification.buckets.is_empty() {
            let _step = info_span!("append_error_log").entered();
            progress.report(ProgressEvent::Phase {
                phase: RunPhase::Logging,
                message: "No page matched a SKU, recording errors...".to_string(),
            });
            let errors = classification.errors.clone();
            let error_log_path = self.config.error_log_path();
            append_error_log(&error_log_path, &errors).map_err(PipelineError::Logging)?;
            ctx.error_log_path = Some(error_log_path.clone());
            ctx.classification = Some(classification);

            progress.report(ProgressEvent::Completed {
                vendors: 0,
                pages: 0,
                errors: errors.len(),
            });
            return Ok(RunOutcome::NoMatchedPages {
                errors,
                error_log_path,
            });
        }

        // Step 3: Vendor PDFs and zip
        let written = {
            let _step = info_span!("write_artifacts").entered();
            progress.report(ProgressEvent::Phase {
                phase: RunPhase::Writing,
                message: format!(
                    "Writing {} vendor PDFs...",
                    classification.buckets.len()
                ),
            });
            self.step_write_artifacts(ctx, &classification)?
        };

        // Step 4: Per-run summary
        let summary_path = {
            let _step = info_span!("write_summary").entered();
            self.writer
                .write_summary(ctx.run_date, &written.summary_records)?
        };
        ctx.summary_path = Some(summary_path.clone());

        // Step 5+6: Audit log and error log
        let (audit_rows, error_log_path) = {
            let _step = info_span!("append_logs").entered();
            progress.report(ProgressEvent::Phase {
                phase: RunPhase::Logging,
                message: "Updating audit and error logs...".to_string(),
            });
            self.step_append_logs(ctx, &written.summary_records, &classification.errors)?
        };

        let report = RunReport {
            run_date,
            total_pages: classification.page_count(),
            matched_pages: classification.buckets.total_pages(),
            vendor_pdfs: written.vendor_pdfs.clone(),
            zip_path: written.zip_path.clone(),
            summary_path,
            summary_records: written.summary_records.clone(),
            audit_log_path: self.config.audit_log_path(),
            audit_rows,
            errors: classification.errors.clone(),
            error_log_path,
            warnings: ctx.warnings.clone(),
        };
        ctx.written = Some(written);
        ctx.classification = Some(classification);

        progress.report(ProgressEvent::Completed {
            vendors: report.vendor_count(),
            pages: report.matched_pages,
            errors: report.error_count(),
        });
        Ok(RunOutcome::Prepared(report))
    }

    fn step_load_mapping(
        &self,
        ctx: &mut RunContext,
        sheet_bytes: &[u8],
    ) -> Result<MappingTable, PipelineError> {
        let mapping = mapping::load_mapping_with(sheet_bytes, self.config.overwrite)?;
        debug!(skus = mapping.len(), "Loaded mapping");

        ctx.warnings.extend(
            mapping
                .duplicates()
                .iter()
                .map(|sku| RunWarning::DuplicateSku { sku: sku.clone() }),
        );
        Ok(mapping)
    }

    fn step_classify(
        &self,
        ctx: &mut RunContext,
        pdf_bytes: &[u8],
        mapping: &MappingTable,
    ) -> Result<Classification, PipelineError> {
        let classification = classifier::classify(pdf_bytes, mapping)?;

        let unmatched: Vec<RunWarning> = classification
            .pages
            .iter()
            .filter(|p| !p.is_matched())
            .map(|p| RunWarning::UnmatchedPage {
                page_index: p.page_index,
            })
            .collect();
        if !unmatched.is_empty() {
            warn!(
                unmatched = unmatched.len(),
                pages = classification.page_count(),
                "Pages without a matching SKU"
            );
        }
        ctx.warnings.extend(unmatched);

        Ok(classification)
    }

    fn step_write_artifacts(
        &self,
        ctx: &RunContext,
        classification: &Classification,
    ) -> Result<WriteResult, PipelineError> {
        let written = self.writer.write_artifacts(
            &classification.document,
            &classification.buckets,
            ctx.run_date,
        )?;
        debug!(
            vendors = written.vendor_pdfs.len(),
            zip = %sanitize::redact_path(&written.zip_path),
            "Wrote vendor artifacts"
        );
        Ok(written)
    }

    fn step_append_logs(
        &self,
        ctx: &mut RunContext,
        records: &[SummaryRecord],
        errors: &[ErrorEntry],
    ) -> Result<(usize, Option<PathBuf>), PipelineError> {
        let audit_rows = append_audit_log(
            &self.config.audit_log_path(),
            records,
            self.config.audit_lock_timeout,
        )
        .map_err(PipelineError::Logging)?;
        ctx.audit_rows = Some(audit_rows);

        if errors.is_empty() {
            return Ok((audit_rows, None));
        }
        let error_log_path = self.config.error_log_path();
        append_error_log(&error_log_path, errors).map_err(PipelineError::Logging)?;
        ctx.error_log_path = Some(error_log_path.clone());
        Ok((audit_rows, Some(error_log_path)))
    }
}
