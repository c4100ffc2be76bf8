//! Drops the pipeline when the project ran too many jobs recently.

use super::retry::retry_optimistic_lock;
use super::step::{Step, StepContext};
use crate::chain::RetryConfig;
use crate::core::FailureReason;
use crate::entities::{Command, Pipeline};
use crate::errors::ChainError;
use crate::quota::{JobActivity, Limit};
use crate::store::PipelineStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Chain step enforcing `ci_active_jobs`.
pub struct JobActivityLimit {
    limit: JobActivity,
    store: Arc<dyn PipelineStore>,
    retry: RetryConfig,
}

impl JobActivityLimit {
    /// Loads the quota over the configured window.
    ///
    /// # Errors
    ///
    /// Propagates store failures while counting jobs.
    pub async fn build(pipeline: &Pipeline, ctx: &StepContext) -> Result<Self, ChainError> {
        let limit = JobActivity::load(
            ctx.store.as_ref(),
            pipeline,
            ctx.config.job_activity_window_hours,
        )
        .await?;
        Ok(Self::new(limit, ctx))
    }

    /// Creates the step from an already computed quota.
    #[must_use]
    pub fn new(limit: JobActivity, ctx: &StepContext) -> Self {
        Self {
            limit,
            store: Arc::clone(&ctx.store),
            retry: ctx.config.optimistic_lock.clone(),
        }
    }
}

impl std::fmt::Debug for JobActivityLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobActivityLimit")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Step for JobActivityLimit {
    fn name(&self) -> &str {
        "limit_job_activity"
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
            "ci_pipeline_chain_limit_job_activity",
            |pipeline| {
                pipeline.drop_with_reason(FailureReason::JobActivityLimitExceeded)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineStatus;
    use crate::entities::{PlanLimits, StageSeed};
    use crate::store::InMemoryPipelineStore;
    use crate::testing::TestProject;

    #[tokio::test]
    async fn test_exceeded_drops_pipeline() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let project = TestProject::new()
            .with_limits(PlanLimits::new().with_active_jobs(2))
            .build();

        let mut busy = Pipeline::new(project.clone(), "main", "abc")
            .with_stages(vec![StageSeed::new("test", ["a", "b", "c"])]);
        store.save(&mut busy).await.unwrap();

        let ctx = StepContext::new(Arc::clone(&store) as Arc<dyn PipelineStore>);
        let mut pipeline = Pipeline::new(project.clone(), "main", "def");
        let mut command = Command::new(project, "main");

        let step = JobActivityLimit::build(&pipeline, &ctx).await.unwrap();
        step.perform(&mut pipeline, &mut command).await.unwrap();

        assert_eq!(pipeline.status, PipelineStatus::Failed);
        assert_eq!(
            pipeline.failure_reason,
            Some(FailureReason::JobActivityLimitExceeded)
        );
        assert!(step.should_break(&pipeline, &command));
    }

    #[tokio::test]
    async fn test_disabled_limit_is_noop() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let ctx = StepContext::new(Arc::clone(&store) as Arc<dyn PipelineStore>);
        let project = TestProject::new().build();
        let mut pipeline = Pipeline::new(project.clone(), "main", "abc");
        let mut command = Command::new(project, "main");

        let step = JobActivityLimit::new(JobActivity::new(0, 500, 24), &ctx);
        step.perform(&mut pipeline, &mut command).await.unwrap();

        assert_eq!(pipeline.status, PipelineStatus::Created);
        assert!(!step.should_break(&pipeline, &command));
    }
}
