//! Drops the pipeline when the project has too many alive pipelines.

use super::retry::retry_optimistic_lock;
use super::step::{Step, StepContext};
use crate::chain::RetryConfig;
use crate::core::FailureReason;
use crate::entities::{Command, Pipeline};
use crate::errors::ChainError;
use crate::quota::{Activity, Limit};
use crate::store::PipelineStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Chain step enforcing `ci_active_pipelines`.
pub struct ActivityLimit {
    limit: Activity,
    store: Arc<dyn PipelineStore>,
    retry: RetryConfig,
}

impl ActivityLimit {
    /// Loads the quota for the pipeline's project.
    ///
    /// # Errors
    ///
    /// Propagates store failures while counting alive pipelines.
    pub async fn build(pipeline: &Pipeline, ctx: &StepContext) -> Result<Self, ChainError> {
        let limit = Activity::load(ctx.store.as_ref(), pipeline).await?;
        Ok(Self::new(limit, ctx))
    }

    /// Creates the step from an already computed quota.
    #[must_use]
    pub fn new(limit: Activity, ctx: &StepContext) -> Self {
        Self {
            limit,
            store: Arc::clone(&ctx.store),
            retry: ctx.config.optimistic_lock.clone(),
        }
    }
}

impl std::fmt::Debug for ActivityLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLimit")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for ActivityLimit {
    fn name(&self) -> &str {
        "limit_activity"
    }

    async fn perform(
        &self,
        pipeline: &mut Pipeline,
        _command: &mut Command,
    ) -> Result<(), ChainError> {
        if !self.limit.exceeded() {
            return Ok(());
        }

        retry_optimistic_lock(
            self.store.as_ref(),
            pipeline,
            &self.retry,
            "ci_pipeline_chain_limit_activity",
            |pipeline| {
                pipeline.drop_with_reason(FailureReason::ActivityLimitExceeded)?;
                Ok(())
            },
        )
        .await?;

        self.limit.log_error(&pipeline.project);
        Ok(())
    }

    fn should_break(&self, _pipeline: &Pipeline, _command: &Command) -> bool {
        self.limit.exceeded()
    }
}
