use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mapping sheet error: {0}")]
    Schema(#[from] SchemaError),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read mapping sheet: {0}")]
    ReadSheet(String),

    #[error("No column containing '{keyword}' found (headers: {headers:?})")]
    MissingColumn {
        keyword: &'static str,
        headers: Vec<String>,
    },

    #[error("Column '{keyword}' is ambiguous, candidates: {candidates:?}")]
    AmbiguousColumn {
        keyword: &'static str,
        candidates: Vec<String>,
    },

    #[error("Duplicate SKU '{sku}' at row {row}")]
    DuplicateSku { sku: String, row: usize },
}

#[derive(Error, Debug)]
pub enum PdfParseError {
    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Failed to extract pages: {0}")]
    Extract(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Failed to build archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to process CSV '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Timed out waiting for lock '{0}'")]
    LockTimeout(PathBuf),

    #[error("Failed to render PDF for vendor '{vendor}': {source}")]
    RenderPdf {
        vendor: String,
        #[source]
        source: PdfParseError,
    },
}

pub type Result<T> = std::result::Result<T, SplitterError>;
