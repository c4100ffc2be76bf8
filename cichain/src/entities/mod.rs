//! Entities the chain and calculators operate on.
//!
//! These are in-memory models of records owned by the surrounding application.
//! The chain only reads and mutates them; persisting them is the job of a
//! [`crate::store::PipelineStore`].

mod build;
mod command;
mod pipeline;
mod project;

pub use build::{Build, BuildMetadata, BuildOptions, JobConfigError, Runner};
pub use command::{Command, Variable};
pub use pipeline::{JobSeed, Pipeline, PipelineSource, StageSeed};
pub use project::{Namespace, PlanLimits, Project, User};
