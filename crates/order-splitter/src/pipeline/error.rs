use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Loading the mapping sheet failed: {0}")]
    Mapping(#[from] crate::error::SchemaError),

    #[error("Reading the orders document failed: {0}")]
    Document(#[from] crate::error::PdfParseError),

    #[error("Writing artifacts failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Updating run logs failed: {0}")]
    Logging(crate::error::StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// 0-based index of a page no SKU matched.
    UnmatchedPage { page_index: usize },
    /// A SKU listed more than once in the mapping sheet; the last row won.
    DuplicateSku { sku: String },
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunWarning::UnmatchedPage { page_index } => {
                write!(f, "Page {}: No matching SKU.", page_index + 1)
            }
            RunWarning::DuplicateSku { sku } => write!(f, "Duplicate SKU '{}'", sku),
        }
    }
}
