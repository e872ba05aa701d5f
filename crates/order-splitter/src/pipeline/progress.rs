use std::fmt;

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    LoadingMapping,
    Classifying,
    Writing,
    Logging,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::LoadingMapping => "loading_mapping",
            RunPhase::Classifying => "classifying",
            RunPhase::Writing => "writing",
            RunPhase::Logging => "logging",
        };
        f.write_str(name)
    }
}

/// Events emitted by the pipeline during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase {
        phase: RunPhase,
        message: String,
    },
    Completed {
        vendors: usize,
        pages: usize,
        errors: usize,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to `tracing`.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                info!(phase = %phase, "{}", message);
            }
            ProgressEvent::Completed {
                vendors,
                pages,
                errors,
            } => {
                info!(vendors, pages, errors, "Run completed");
            }
            ProgressEvent::Failed { error } => {
                warn!("Run failed: {}", error);
            }
        }
    }
}
