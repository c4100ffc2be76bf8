//! Step traits and the built-in step set.

use super::{ActivityLimit, JobActivityLimit, SizeLimit};
use crate::config::ChainConfig;
use crate::entities::{Command, Pipeline};
use crate::errors::ChainError;
use crate::store::PipelineStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// One unit of the pipeline creation chain.
///
/// A step is built fresh for every run, so anything computed at construction
/// (quota usage, for instance) reflects the pipeline as it was at that point.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Applies the step to the pipeline and command.
    ///
    /// # Errors
    ///
    /// Errors abort the chain and are returned to the caller unchanged.
    async fn perform(&self, pipeline: &mut Pipeline, command: &mut Command)
        -> Result<(), ChainError>;

    /// Returns true if the chain must stop after this step.
    fn should_break(&self, pipeline: &Pipeline, command: &Command) -> bool;
}

/// Builds a [`Step`] for one chain run.
#[async_trait]
pub trait StepFactory: Send + Sync + Debug {
    /// The step this factory produces.
    type Step: Step;

    /// Builds the step against the current pipeline and command.
    ///
    /// # Errors
    ///
    /// Fails if the step cannot load what it needs, e.g. quota usage.
    async fn build(
        &self,
        pipeline: &Pipeline,
        command: &Command,
        ctx: &StepContext,
    ) -> Result<Self::Step, ChainError>;
}

/// Collaborators shared by all steps of a chain.
#[derive(Clone)]
pub struct StepContext {
    /// Persistence and usage counting.
    pub store: Arc<dyn PipelineStore>,
    /// Chain settings.
    pub config: ChainConfig,
}

impl StepContext {
    /// Creates a context with default settings.
    #[must_use]
    pub fn new(store: Arc<dyn PipelineStore>) -> Self {
        Self {
            store,
            config: ChainConfig::default(),
        }
    }

    /// Sets the chain settings.
    #[must_use]
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }
}

impl Debug for StepContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The built-in chain steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Alive pipelines quota.
    ActivityLimit,
    /// Recently active jobs quota.
    JobActivityLimit,
    /// Jobs per pipeline quota.
    SizeLimit,
}

impl StepKind {
    /// The order used when creating a pipeline.
    ///
    /// Activity runs first: the size step only ever sees projects that are
    /// within their alive pipelines quota.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::ActivityLimit, Self::SizeLimit, Self::JobActivityLimit]
    }

    /// Step name used in logs and events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActivityLimit => "limit_activity",
            Self::JobActivityLimit => "limit_job_activity",
            Self::SizeLimit => "limit_size",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
impl StepFactory for StepKind {
    type Step = ChainStep;

    async fn build(
        &self,
        pipeline: &Pipeline,
        _command: &Command,
        ctx: &StepContext,
    ) -> Result<ChainStep, ChainError> {
        Ok(match self {
            Self::ActivityLimit => ChainStep::Activity(ActivityLimit::build(pipeline, ctx).await?),
            Self::JobActivityLimit => {
                ChainStep::JobActivity(JobActivityLimit::build(pipeline, ctx).await?)
            }
            Self::SizeLimit => ChainStep::Size(SizeLimit::build(pipeline, ctx)),
        })
    }
}

/// A built-in step, ready to run.
#[derive(Debug)]
pub enum ChainStep {
    /// See [`ActivityLimit`].
    Activity(ActivityLimit),
    /// See [`JobActivityLimit`].
    JobActivity(JobActivityLimit),
    /// See [`SizeLimit`].
    Size(SizeLimit),
}

#[async_trait]
impl Step for ChainStep {
    fn name(&self) -> &str {
        match self {
            Self::Activity(step) => step.name(),
            Self::JobActivity(step) => step.name(),
            Self::Size(step) => step.name(),
        }
    }

    async fn perform(
        &self,
        pipeline: &mut Pipeline,
        command: &mut Command,
    ) -> Result<(), ChainError> {
        match self {
            Self::Activity(step) => step.perform(pipeline, command).await,
            Self::JobActivity(step) => step.perform(pipeline, command).await,
            Self::Size(step) => step.perform(pipeline, command).await,
        }
    }

    fn should_break(&self, pipeline: &Pipeline, command: &Command) -> bool {
        match self {
            Self::Activity(step) => step.should_break(pipeline, command),
            Self::JobActivity(step) => step.should_break(pipeline, command),
            Self::Size(step) => step.should_break(pipeline, command),
        }
    }
}
