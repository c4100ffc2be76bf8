//! Rejects pipelines with more jobs than the plan allows.

use super::step::{Step, StepContext};
use crate::core::FailureReason;
use crate::entities::{Command, Pipeline};
use crate::errors::ChainError;
use crate::quota::{Limit, Size};
use crate::store::PipelineStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Chain step enforcing `ci_pipeline_size`.
pub struct SizeLimit {
    limit: Size,
    store: Arc<dyn PipelineStore>,
}

impl SizeLimit {
    /// Computes the quota from the pipeline's own jobs.
    #[must_use]
    pub fn build(pipeline: &Pipeline, ctx: &StepContext) -> Self {
        Self::new(Size::for_pipeline(&pipeline.project, pipeline), ctx)
    }

    /// Creates the step from an already computed quota.
    #[must_use]
    pub fn new(limit: Size, ctx: &StepContext) -> Self {
        Self {
            limit,
            store: Arc::clone(&ctx.store),
        }
    }
}

impl std::fmt::Debug for SizeLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeLimit")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for SizeLimit {
    fn name(&self) -> &str {
        "limit_size"
    }

    async fn perform(
        &self,
        pipeline: &mut Pipeline,
        command: &mut Command,
    ) -> Result<(), ChainError> {
        let Some(message) = self.limit.message() else {
            return Ok(());
        };

        if command.save_incompleted {
            if pipeline.failure_reason.is_none() {
                pipeline.failure_reason = Some(FailureReason::SizeLimitExceeded);
            }
            if !pipeline.try_drop() {
                debug!(status = %pipeline.status, "Pipeline already dropped");
            }
            self.store.save(pipeline).await?;
        }

        self.limit.log_error(&pipeline.project);
        command.error(FailureReason::SizeLimitExceeded, message);
        Ok(())
    }

    fn should_break(&self, _pipeline: &Pipeline, _command: &Command) -> bool {
        self.limit.exceeded()
    }
}
