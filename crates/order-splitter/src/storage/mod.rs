pub mod archive;
pub mod filesystem;
pub mod naming;
pub mod writer;

pub use filesystem::FileStorage;
pub use naming::{format_run_date, parse_run_date};
pub use writer::{write_artifacts, ArtifactWriter, WriteResult, WrittenPdf};
