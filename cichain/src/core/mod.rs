//! Core pipeline state types.

mod status;

pub use status::{FailureReason, LockState, PipelineEvent, PipelineStatus, TransitionError};
