//! The pipeline creation command.

use super::{PipelineSource, Project, User};
use crate::core::FailureReason;
use crate::errors::CommandError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A pipeline variable passed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable key.
    pub key: String,
    /// Variable value.
    pub value: String,
}

/// Context for one pipeline creation request.
///
/// Steps append to `errors`; whoever runs the chain reads them once it halts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Correlation ID for logs and events.
    pub request_id: Uuid,
    /// Project the pipeline is created in.
    pub project: Arc<Project>,
    /// The acting user.
    pub current_user: Option<User>,
    /// What triggered the creation.
    pub source: PipelineSource,
    /// Git ref.
    pub ref_name: String,
    /// Commit SHA, when already resolved.
    pub sha: Option<String>,
    /// Pipeline variables.
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Persist a failed pipeline when a limit stops creation.
    #[serde(default)]
    pub save_incompleted: bool,
    /// Errors accumulated by chain steps.
    #[serde(default)]
    pub errors: Vec<CommandError>,
}

impl Command {
    /// Creates a command for `ref_name` in `project`.
    #[must_use]
    pub fn new(project: Arc<Project>, ref_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            project,
            current_user: None,
            source: PipelineSource::default(),
            ref_name: ref_name.into(),
            sha: None,
            variables: Vec::new(),
            save_incompleted: false,
            errors: Vec::new(),
        }
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.current_user = Some(user);
        self
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: PipelineSource) -> Self {
        self.source = source;
        self
    }

    /// Sets the commit SHA.
    #[must_use]
    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push(Variable {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Sets whether incomplete pipelines are persisted.
    #[must_use]
    pub fn with_save_incompleted(mut self, save: bool) -> Self {
        self.save_incompleted = save;
        self
    }

    /// Appends an error for a failure reason.
    pub fn error(&mut self, reason: FailureReason, message: impl Into<String>) {
        self.errors.push(
            CommandError::for_reason(reason, message)
                .with_context_entry("project_id", self.project.id.to_string()),
        );
    }

    /// Returns true if any step recorded an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the error messages in the order they were recorded.
    #[must_use]
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestProject;

    #[test]
    fn test_command_builder() {
        let command = Command::new(TestProject::new().build(), "main")
            .with_user(User::new(1, "root"))
            .with_source(PipelineSource::Web)
            .with_sha("deadbeef")
            .with_variable("DEPLOY", "true")
            .with_save_incompleted(true);

        assert_eq!(command.ref_name, "main");
        assert_eq!(command.source, PipelineSource::Web);
        assert_eq!(command.variables.len(), 1);
        assert!(command.save_incompleted);
        assert!(!command.has_errors());
    }

    #[test]
    fn test_error_appends_structured_entry() {
        let mut command = Command::new(TestProject::new().with_id(9).build(), "main");
        command.error(FailureReason::SizeLimitExceeded, "Pipeline size limit exceeded by 2 jobs!");

        assert!(command.has_errors());
        assert_eq!(command.errors[0].code, "size_limit_exceeded");
        assert_eq!(command.errors[0].context.get("project_id"), Some(&"9".to_string()));
        assert_eq!(command.error_messages(), vec!["Pipeline size limit exceeded by 2 jobs!"]);
    }
}
