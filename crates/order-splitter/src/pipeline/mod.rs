pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use context::RunContext;
pub use error::{PipelineError, RunWarning};
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, RunPhase, TracingProgress};
pub use runner::{Pipeline, RunOutcome, RunReport};
