//! The pipeline creation chain.
//!
//! A [`Sequence`] builds and performs steps one after another. Each step may
//! change the pipeline, record errors on the command and ask the chain to
//! stop. The built-in steps enforce plan quotas:
//!
//! - [`SizeLimit`]: too many jobs in the pipeline itself
//! - [`ActivityLimit`]: too many alive pipelines in the project
//! - [`JobActivityLimit`]: too many recently active jobs in the project

mod activity_limit;
mod job_activity_limit;
mod retry;
mod sequence;
mod size_limit;
mod step;

#[cfg(test)]
mod integration_tests;

pub use activity_limit::ActivityLimit;
pub use job_activity_limit::JobActivityLimit;
pub use retry::{
    retry_optimistic_lock, should_retry, BackoffStrategy, JitterStrategy, RetryConfig,
    RetryDecision, RetryState,
};
pub use sequence::{Sequence, SequenceOutcome};
pub use size_limit::SizeLimit;
pub use step::{ChainStep, Step, StepContext, StepFactory, StepKind};
