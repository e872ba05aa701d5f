pub mod audit;
pub mod classifier;
pub mod config;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod storage;

pub use audit::{append_audit_log, append_error_log, SummaryRecord};
pub use classifier::{classify, Classification, ErrorEntry, PageClassification, VendorBucket};
pub use config::{load_config, Config, OverwritePolicy};
pub use error::{
    ConfigError, PdfParseError, Result, SchemaError, SplitterError, StorageError,
};
pub use mapping::{load_mapping, load_mapping_with, MappingTable, SkuRecord};
pub use pipeline::{Pipeline, PipelineConfig, RunContext, RunOutcome, RunReport};
pub use storage::{write_artifacts, ArtifactWriter, WriteResult};
