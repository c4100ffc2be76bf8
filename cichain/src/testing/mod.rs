//! Testing utilities for the pipeline chain.
//!
//! This module provides:
//! - Project and pipeline builders
//! - Scripted steps that record what the chain did
//! - Assertions on pipeline and command state

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_command_errors, assert_pipeline_dropped, assert_pipeline_untouched};
pub use fixtures::{pipeline_with_jobs, TestProject};
pub use mocks::{ScriptedStep, StepLog};
