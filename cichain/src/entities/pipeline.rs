//! The pipeline entity under construction.

use super::Project;
use crate::core::{FailureReason, LockState, PipelineEvent, PipelineStatus, TransitionError};
use crate::utils::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What triggered a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineSource {
    /// A git push.
    #[default]
    Push,
    /// Started from the web UI.
    Web,
    /// Started through a trigger token.
    Trigger,
    /// Started by a pipeline schedule.
    Schedule,
    /// Started through the API.
    Api,
    /// Started for a merge request.
    MergeRequestEvent,
    /// Started by a parent pipeline.
    ParentPipeline,
}

/// A job the pipeline would create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSeed {
    /// Job name.
    pub name: String,
}

impl JobSeed {
    /// Creates a job seed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A stage and the jobs it would create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSeed {
    /// Stage name.
    pub name: String,
    /// Jobs in the stage.
    pub jobs: Vec<JobSeed>,
}

impl StageSeed {
    /// Creates a stage seed from job names.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            jobs: jobs.into_iter().map(JobSeed::new).collect(),
        }
    }
}

/// A CI pipeline.
///
/// Chain steps mutate it in place. Once it has been dropped with a failure
/// reason it never leaves the `failed` status again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline ID, `None` until persisted.
    pub id: Option<u64>,
    /// Owning project.
    pub project: Arc<Project>,
    /// Git ref the pipeline runs for.
    pub ref_name: String,
    /// Commit SHA.
    pub sha: String,
    /// What triggered the pipeline.
    pub source: PipelineSource,
    /// Current status.
    pub status: PipelineStatus,
    /// Why the pipeline failed.
    pub failure_reason: Option<FailureReason>,
    /// Artifact lock state.
    pub locked: LockState,
    /// Optimistic locking version, bumped by the store on every save.
    pub lock_version: u64,
    /// Stages and jobs the pipeline would create.
    pub stages: Vec<StageSeed>,
    /// When the pipeline was built.
    pub created_at: Timestamp,
    /// When the pipeline reached a completed status.
    pub finished_at: Option<Timestamp>,
}

impl Pipeline {
    /// Creates an unsaved pipeline.
    #[must_use]
    pub fn new(project: Arc<Project>, ref_name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            id: None,
            project,
            ref_name: ref_name.into(),
            sha: sha.into(),
            source: PipelineSource::default(),
            status: PipelineStatus::Created,
            failure_reason: None,
            locked: LockState::default(),
            lock_version: 0,
            stages: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Sets the pipeline source.
    #[must_use]
    pub fn with_source(mut self, source: PipelineSource) -> Self {
        self.source = source;
        self
    }

    /// Sets the stages the pipeline would create.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<StageSeed>) -> Self {
        self.stages = stages;
        self
    }

    /// Returns true once the store has assigned an ID.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns true for an alive pipeline the store does not know about yet.
    ///
    /// Quotas count such a pipeline on top of the stored usage.
    #[must_use]
    pub fn is_candidate(&self) -> bool {
        !self.is_persisted() && self.status.is_alive()
    }

    /// Returns true if the pipeline was dropped with a failure reason.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.status == PipelineStatus::Failed && self.failure_reason.is_some()
    }

    /// Total number of jobs across all stages.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.jobs.len()).sum()
    }

    /// Applies a status event.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Dropped`] if the pipeline was already dropped,
    /// or [`TransitionError::Invalid`] if the event is not allowed.
    pub fn fire(&mut self, event: PipelineEvent) -> Result<PipelineStatus, TransitionError> {
        if let (PipelineStatus::Failed, Some(reason)) = (self.status, self.failure_reason) {
            if event != PipelineEvent::Drop {
                return Err(TransitionError::Dropped { reason, event });
            }
        }

        let to = self
            .status
            .transition(event)
            .ok_or(TransitionError::Invalid {
                from: self.status,
                event,
            })?;

        if matches!(
            to,
            PipelineStatus::Success | PipelineStatus::Failed | PipelineStatus::Canceled
        ) {
            self.finished_at = Some(Utc::now());
        }
        self.status = to;
        Ok(to)
    }

    /// Drops the pipeline, recording `reason`.
    ///
    /// # Errors
    ///
    /// Fails if the pipeline is already failed.
    pub fn drop_with_reason(&mut self, reason: FailureReason) -> Result<(), TransitionError> {
        self.fire(PipelineEvent::Drop)?;
        self.failure_reason = Some(reason);
        Ok(())
    }

    /// Drops the pipeline keeping any failure reason already set.
    ///
    /// Returns false instead of failing when the transition is not allowed.
    pub fn try_drop(&mut self) -> bool {
        self.fire(PipelineEvent::Drop).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestProject;

    fn pipeline() -> Pipeline {
        Pipeline::new(TestProject::new().build(), "main", "a1b2c3")
    }

    #[test]
    fn test_new_pipeline_is_created_and_unsaved() {
        let pipeline = pipeline();
        assert_eq!(pipeline.status, PipelineStatus::Created);
        assert!(!pipeline.is_persisted());
        assert!(pipeline.failure_reason.is_none());
    }

    #[test]
    fn test_candidate_until_saved_or_dropped() {
        let mut saved = pipeline();
        assert!(saved.is_candidate());
        saved.id = Some(7);
        assert!(!saved.is_candidate());

        let mut dropped = pipeline();
        dropped.drop_with_reason(FailureReason::ConfigError).unwrap();
        assert!(!dropped.is_candidate());
    }

    #[test]
    fn test_job_count() {
        let pipeline = pipeline().with_stages(vec![
            StageSeed::new("build", ["compile"]),
            StageSeed::new("test", ["rspec", "jest"]),
        ]);
        assert_eq!(pipeline.job_count(), 3);
    }

    #[test]
    fn test_drop_with_reason() {
        let mut pipeline = pipeline();
        pipeline
            .drop_with_reason(FailureReason::ActivityLimitExceeded)
            .unwrap();

        assert_eq!(pipeline.status, PipelineStatus::Failed);
        assert_eq!(pipeline.failure_reason, Some(FailureReason::ActivityLimitExceeded));
        assert!(pipeline.finished_at.is_some());
        assert!(pipeline.is_dropped());
    }

    #[test]
    fn test_drop_twice_is_rejected() {
        let mut pipeline = pipeline();
        pipeline.drop_with_reason(FailureReason::ConfigError).unwrap();

        let err = pipeline
            .drop_with_reason(FailureReason::SizeLimitExceeded)
            .unwrap_err();
        assert!(matches!(err, TransitionError::Invalid { .. }));
        assert_eq!(pipeline.failure_reason, Some(FailureReason::ConfigError));
    }

    #[test]
    fn test_dropped_pipeline_cannot_be_reactivated() {
        let mut pipeline = pipeline();
        pipeline.drop_with_reason(FailureReason::ActivityLimitExceeded).unwrap();

        let err = pipeline.fire(PipelineEvent::Enqueue).unwrap_err();
        assert!(matches!(err, TransitionError::Dropped { .. }));
        assert_eq!(pipeline.status, PipelineStatus::Failed);
    }

    #[test]
    fn test_try_drop_is_tolerant() {
        let mut pipeline = pipeline();
        pipeline.failure_reason = Some(FailureReason::SizeLimitExceeded);

        assert!(pipeline.try_drop());
        assert!(!pipeline.try_drop());
        assert_eq!(pipeline.failure_reason, Some(FailureReason::SizeLimitExceeded));
    }

    #[test]
    fn test_failed_without_reason_can_be_retried() {
        let mut pipeline = pipeline();
        pipeline.fire(PipelineEvent::Drop).unwrap();

        assert_eq!(pipeline.fire(PipelineEvent::Enqueue).unwrap(), PipelineStatus::Running);
    }
}
