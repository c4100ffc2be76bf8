//! Pipeline status state machine and failure reasons.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The status of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Pipeline has been built but not queued.
    #[default]
    Created,
    /// Waiting for a resource group.
    WaitingForResource,
    /// Preparing environments.
    Preparing,
    /// Queued for runners.
    Pending,
    /// At least one job is running.
    Running,
    /// All jobs passed.
    Success,
    /// The pipeline failed; see the failure reason.
    Failed,
    /// The pipeline was canceled.
    Canceled,
    /// The pipeline was skipped.
    Skipped,
    /// Blocked on a manual action.
    Manual,
    /// Delayed until a scheduled time.
    Scheduled,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::WaitingForResource => "waiting_for_resource",
            Self::Preparing => "preparing",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        };
        write!(f, "{s}")
    }
}

impl PipelineStatus {
    /// Returns true if the status is one of the completed states.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Canceled | Self::Skipped)
    }

    /// Returns true if the pipeline still counts against activity quotas.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(
            self,
            Self::Created
                | Self::WaitingForResource
                | Self::Preparing
                | Self::Pending
                | Self::Running
                | Self::Scheduled
        )
    }

    /// Computes the target status for an event.
    ///
    /// Returns `None` when the event is not allowed from this status.
    #[must_use]
    pub fn transition(self, event: PipelineEvent) -> Option<Self> {
        use PipelineEvent as E;
        use PipelineStatus as S;

        match (event, self) {
            (
                E::Enqueue,
                S::Created
                | S::Manual
                | S::WaitingForResource
                | S::Preparing
                | S::Skipped
                | S::Scheduled,
            ) => Some(S::Pending),
            (E::Enqueue, S::Success | S::Failed | S::Canceled | S::Running) => Some(S::Running),
            (E::Enqueue, S::Pending) => None,
            (E::RequestResource, s) => {
                (s != S::WaitingForResource).then_some(S::WaitingForResource)
            }
            (E::Prepare, s) => (s != S::Preparing).then_some(S::Preparing),
            (E::Run, s) => (s != S::Running).then_some(S::Running),
            (E::Skip, s) => (s != S::Skipped).then_some(S::Skipped),
            (E::Drop, s) => (s != S::Failed).then_some(S::Failed),
            (E::Succeed, s) => (s != S::Success).then_some(S::Success),
            (E::Cancel, s) => (s != S::Canceled).then_some(S::Canceled),
            (E::Block, s) => (s != S::Manual).then_some(S::Manual),
            (E::Delay, s) => (s != S::Scheduled).then_some(S::Scheduled),
        }
    }
}

/// Events that move a pipeline between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Queue the pipeline.
    Enqueue,
    /// Wait for a resource group.
    RequestResource,
    /// Start preparing.
    Prepare,
    /// Start running.
    Run,
    /// Skip the pipeline.
    Skip,
    /// Fail the pipeline.
    Drop,
    /// Mark the pipeline as successful.
    Succeed,
    /// Cancel the pipeline.
    Cancel,
    /// Block on a manual action.
    Block,
    /// Delay until a scheduled time.
    Delay,
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Enqueue => "enqueue",
            Self::RequestResource => "request_resource",
            Self::Prepare => "prepare",
            Self::Run => "run",
            Self::Skip => "skip",
            Self::Drop => "drop",
            Self::Succeed => "succeed",
            Self::Cancel => "cancel",
            Self::Block => "block",
            Self::Delay => "delay",
        };
        write!(f, "{s}")
    }
}

/// Why a pipeline ended up failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No specific reason recorded.
    UnknownFailure,
    /// The CI configuration is invalid.
    ConfigError,
    /// An external validation service rejected the pipeline.
    ExternalValidationFailure,
    /// Too many alive pipelines in the project.
    ActivityLimitExceeded,
    /// The pipeline has too many jobs.
    SizeLimitExceeded,
    /// Too many active jobs in the recent window.
    JobActivityLimitExceeded,
    /// The triggering user is blocked.
    UserBlocked,
    /// The project was deleted while creating the pipeline.
    ProjectDeleted,
}

impl FailureReason {
    /// Returns the stable code for this reason.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownFailure => "unknown_failure",
            Self::ConfigError => "config_error",
            Self::ExternalValidationFailure => "external_validation_failure",
            Self::ActivityLimitExceeded => "activity_limit_exceeded",
            Self::SizeLimitExceeded => "size_limit_exceeded",
            Self::JobActivityLimitExceeded => "job_activity_limit_exceeded",
            Self::UserBlocked => "user_blocked",
            Self::ProjectDeleted => "project_deleted",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Artifact lock state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Artifacts may expire.
    #[default]
    Unlocked,
    /// Artifacts are kept.
    ArtifactsLocked,
}

/// Error raised when a status transition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not allowed from the current status.
    #[error("Cannot transition status via :{event} from :{from}")]
    Invalid {
        /// The current status.
        from: PipelineStatus,
        /// The rejected event.
        event: PipelineEvent,
    },

    /// The pipeline was dropped and cannot leave the failed state.
    #[error("Pipeline was dropped ({reason}) and cannot transition via :{event}")]
    Dropped {
        /// The recorded failure reason.
        reason: FailureReason,
        /// The rejected event.
        event: PipelineEvent,
    },
}
