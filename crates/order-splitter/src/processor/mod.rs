pub mod pdf;

pub use pdf::SourceDocument;
