//! Test harness for isolated pipeline runs.
//!
//! Each `TestHarness` owns a temp directory with its own output root and log
//! directory, so tests never share audit logs or artifacts.

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use order_splitter::config::{Config, OverwritePolicy};
use order_splitter::pipeline::{
    NoopProgress, Pipeline, PipelineConfig, PipelineError, RunOutcome, RunReport,
};

use super::builders::ConfigBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    pub output_root: PathBuf,
    pub log_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let output_root = base.join("daily_output");
        let log_dir = base.join("logs");
        let config_dir = base.join("config");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        Self {
            temp_dir,
            output_root,
            log_dir,
            config_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config pointing at this harness's directories.
    pub fn config(&self) -> Config {
        self.config_with(OverwritePolicy::LastWriteWins)
    }

    pub fn config_with(&self, policy: OverwritePolicy) -> Config {
        ConfigBuilder::new()
            .output_root(&self.output_root.display().to_string())
            .log_dir(&self.log_dir.display().to_string())
            .overwrite(policy)
            .audit_lock_timeout_ms(5_000)
            .build()
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with(OverwritePolicy::LastWriteWins)
    }

    pub fn pipeline_with(&self, policy: OverwritePolicy) -> Pipeline {
        Pipeline::from_config(Arc::new(PipelineConfig::from_config(
            &self.config_with(policy),
        )))
    }

    pub fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).expect("valid date")
    }

    pub fn run(&self, sheet: &[u8], pdf: &[u8]) -> Result<RunOutcome, PipelineError> {
        self.pipeline()
            .run(sheet, pdf, Self::run_date(), &NoopProgress)
    }

    /// Runs and expects a `Prepared` outcome.
    pub fn run_prepared(&self, sheet: &[u8], pdf: &[u8]) -> RunReport {
        match self.run(sheet, pdf).expect("Pipeline run failed") {
            RunOutcome::Prepared(report) => report,
            other => panic!("Expected Prepared outcome, got {:?}", other),
        }
    }

    /// `{output_root}/3-7-2026`
    pub fn run_dir(&self) -> PathBuf {
        self.output_root.join("3-7-2026")
    }

    pub fn vendor_pdf_path(&self, vendor: &str) -> PathBuf {
        self.run_dir()
            .join("Depot")
            .join(format!("Depot 3-7-2026 order page 1 {}.pdf", vendor))
    }

    pub fn zip_path(&self) -> PathBuf {
        self.run_dir().join("Depot 3-7-2026.zip")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.run_dir().join("Depot 3-7-2026 summary report.csv")
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.log_dir.join("sent_orders_log.csv")
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.log_dir.join("error_log.txt")
    }

    pub fn write_config(&self, filename: &str, config: &Config) -> PathBuf {
        let path = self.config_dir.join(filename);
        let json = serde_json::to_string_pretty(config).expect("Failed to serialize config");
        std::fs::write(&path, json).expect("Failed to write config file");
        path
    }

    /// Entry names and contents of the zip at `path`, in archive order.
    pub fn zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let bytes = std::fs::read(path).expect("Failed to read zip");
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("Invalid zip");
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).expect("Missing zip entry");
                let mut content = Vec::new();
                entry
                    .read_to_end(&mut content)
                    .expect("Failed to read zip entry");
                (entry.name().to_string(), content)
            })
            .collect()
    }

    /// Texts of every page of a written PDF.
    pub fn pdf_page_texts(path: &Path) -> Vec<String> {
        let document = order_splitter::processor::SourceDocument::load(path)
            .expect("Failed to load written PDF");
        (0..document.page_count())
            .map(|i| document.page_text(i))
            .collect()
    }
}
