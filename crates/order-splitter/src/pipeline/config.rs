use std::path::PathBuf;
use std::time::Duration;

use crate::audit::{AUDIT_LOG_FILENAME, ERROR_LOG_FILENAME};
use crate::config::{Config, OverwritePolicy};

pub struct PipelineConfig {
    pub store_label: String,
    pub output_root: PathBuf,
    pub log_dir: PathBuf,
    pub overwrite: OverwritePolicy,
    pub audit_lock_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            store_label: config.store_label.clone(),
            output_root: PathBuf::from(&config.output_root),
            log_dir: PathBuf::from(&config.log_dir),
            overwrite: config.overwrite,
            audit_lock_timeout: Duration::from_millis(config.audit_lock_timeout_ms),
        }
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.log_dir.join(AUDIT_LOG_FILENAME)
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.log_dir.join(ERROR_LOG_FILENAME)
    }
}
