//! Assertions on chain results.

use crate::core::{FailureReason, PipelineStatus};
use crate::entities::{Command, Pipeline};

/// Asserts that the pipeline was dropped with `reason`.
pub fn assert_pipeline_dropped(pipeline: &Pipeline, reason: FailureReason) {
    assert_eq!(
        (pipeline.status, pipeline.failure_reason),
        (PipelineStatus::Failed, Some(reason)),
        "Expected pipeline dropped with {reason}, got status {} and reason {:?}",
        pipeline.status,
        pipeline.failure_reason
    );
}

/// Asserts that no step touched the pipeline status.
pub fn assert_pipeline_untouched(pipeline: &Pipeline) {
    assert_eq!(
        pipeline.status,
        PipelineStatus::Created,
        "Expected pipeline still created, got {}",
        pipeline.status
    );
    assert!(
        pipeline.failure_reason.is_none(),
        "Expected no failure reason, got {:?}",
        pipeline.failure_reason
    );
}

/// Asserts that the command carries exactly these error messages.
pub fn assert_command_errors(command: &Command, expected: &[&str]) {
    assert_eq!(
        command.error_messages(),
        expected,
        "Unexpected command errors"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestProject;

    #[test]
    fn test_dropped_assertion() {
        let mut pipeline = Pipeline::new(TestProject::new().build(), "main", "abc");
        assert_pipeline_untouched(&pipeline);

        pipeline.drop_with_reason(FailureReason::SizeLimitExceeded).unwrap();
        assert_pipeline_dropped(&pipeline, FailureReason::SizeLimitExceeded);
    }

    #[test]
    #[should_panic(expected = "Expected pipeline dropped")]
    fn test_dropped_assertion_fails() {
        let pipeline = Pipeline::new(TestProject::new().build(), "main", "abc");
        assert_pipeline_dropped(&pipeline, FailureReason::ActivityLimitExceeded);
    }

    #[test]
    fn test_command_errors() {
        let mut command = Command::new(TestProject::new().build(), "main");
        assert_command_errors(&command, &[]);

        command.error(FailureReason::SizeLimitExceeded, "too big");
        assert_command_errors(&command, &["too big"]);
    }
}
