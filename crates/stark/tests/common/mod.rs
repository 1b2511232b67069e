//! Shared test utilities for stark integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp upload/work directories
//! - `ConfigBuilder` plus shell stand-ins for the converter and spooler

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
