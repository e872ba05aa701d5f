//! Shared test utilities for order-splitter integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs over temp output and log directories
//! - Builders that synthesize orders PDFs and mapping sheets in memory

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
