//! Error types for the cichain crate.
//!
//! Quota violations are never errors: they are recorded on the pipeline and as
//! [`CommandError`] entries on the command. Everything here is either malformed
//! configuration (`extends` problems) or a broken invariant that the caller has
//! to surface.

use crate::core::{FailureReason, TransitionError};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// A pipeline status transition was rejected.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// The pipeline store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Configuration `extends` resolution failed.
    #[error("{0}")]
    Extension(#[from] ExtensionError),

    /// Chain configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A code-level invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured error appended to a pipeline creation command.
///
/// The `code` is stable and machine readable; `message` is what end users see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    /// Error code (e.g., "size_limit_exceeded").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Hint for fixing the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl CommandError {
    /// Creates a new command error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Creates an error for a pipeline failure reason, with the default hint.
    #[must_use]
    pub fn for_reason(reason: FailureReason, message: impl Into<String>) -> Self {
        let err = Self::new(reason.code(), message);
        match ErrorSuggestions::get(reason.code()) {
            Some(hint) => err.with_fix_hint(hint),
            None => err,
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::String(self.code.clone()));
        map.insert("message".to_string(), serde_json::Value::String(self.message.clone()));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::Value::String(hint.clone()));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors raised while resolving `extends` in a CI configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionError {
    /// An `extends` reference is missing, malformed or nested too deep.
    #[error("{0}")]
    Invalid(#[from] InvalidExtensionError),

    /// An `extends` chain refers back to one of its own ancestors.
    #[error("{0}")]
    CircularDependency(#[from] CircularDependencyError),
}

impl ExtensionError {
    /// Returns the configuration key that failed to resolve.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Invalid(err) => &err.key,
            Self::CircularDependency(err) => &err.key,
        }
    }
}

/// Error raised when an `extends` target does not exist or is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: {message}")]
pub struct InvalidExtensionError {
    /// The entry whose `extends` is invalid.
    pub key: String,
    /// What is wrong with it.
    pub message: String,
}

impl InvalidExtensionError {
    /// Creates a new invalid extension error.
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// The entry extends keys that are not in the document.
    #[must_use]
    pub fn unknown_keys(key: impl Into<String>, unknown: &[String]) -> Self {
        Self::new(key, format!("unknown keys in `extends` ({})", unknown.join(", ")))
    }

    /// The extended entry is not a mapping.
    #[must_use]
    pub fn invalid_base(key: impl Into<String>) -> Self {
        Self::new(key, "invalid base hash in `extends`")
    }

    /// The `extends` value is neither a string nor a list of strings.
    #[must_use]
    pub fn invalid_type(key: impl Into<String>) -> Self {
        Self::new(key, "`extends` must be a string or an array of strings")
    }

    /// The chain of ancestors is longer than allowed.
    #[must_use]
    pub fn nesting_too_deep(key: impl Into<String>) -> Self {
        Self::new(key, "nesting too deep in `extends`")
    }
}

/// Error raised when an `extends` chain cycles back to an ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: circular dependency detected in `extends` ({})", path.join(" -> "))]
pub struct CircularDependencyError {
    /// The key that was revisited.
    pub key: String,
    /// The resolution path, ending with the revisited key.
    pub path: Vec<String>,
}

impl CircularDependencyError {
    /// Creates a new circular dependency error.
    #[must_use]
    pub fn new(key: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            key: key.into(),
            path,
        }
    }
}

/// Error raised when chain configuration fails validation or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid chain configuration: {0}")]
pub struct ConfigError(pub String);

/// Provides default fix hints for command error codes.
pub struct ErrorSuggestions;

impl ErrorSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "activity_limit_exceeded" => Some(
                "Wait for running pipelines to finish or cancel some of them \
                 before creating new ones.",
            ),
            "job_activity_limit_exceeded" => Some(
                "Too many jobs were active recently. Wait for them to finish \
                 before creating new pipelines.",
            ),
            "size_limit_exceeded" => Some(
                "Reduce the number of jobs in the pipeline, for example by splitting \
                 the configuration into parent and child pipelines.",
            ),
            "config_error" => Some("Check the CI configuration with the linter."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_creation() {
        let err = CommandError::new("custom", "Something broke")
            .with_fix_hint("Do the other thing")
            .with_context_entry("project", "42");

        assert_eq!(err.code, "custom");
        assert_eq!(err.message, "Something broke");
        assert_eq!(err.fix_hint, Some("Do the other thing".to_string()));
        assert_eq!(err.context.get("project"), Some(&"42".to_string()));
        assert_eq!(err.to_string(), "Something broke");
    }

    #[test]
    fn test_command_error_for_reason_has_hint() {
        let err = CommandError::for_reason(
            FailureReason::SizeLimitExceeded,
            "Pipeline size limit exceeded by 1 job!",
        );

        assert_eq!(err.code, "size_limit_exceeded");
        assert!(err.fix_hint.is_some());
    }

    #[test]
    fn test_command_error_to_dict() {
        let err = CommandError::new("config_error", "bad yaml");
        let dict = err.to_dict();

        assert_eq!(dict.get("code").unwrap(), "config_error");
        assert_eq!(dict.get("message").unwrap(), "bad yaml");
        assert!(!dict.contains_key("context"));
    }

    #[test]
    fn test_unknown_keys_message() {
        let err = InvalidExtensionError::unknown_keys("rspec", &["something".to_string()]);
        assert_eq!(err.to_string(), "rspec: unknown keys in `extends` (something)");
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = CircularDependencyError::new(
            "a",
            vec!["a".to_string(), "b".to_string(), "a".to_string()],
        );

        assert!(err.to_string().starts_with("a: circular dependency detected in `extends`"));
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_extension_error_key() {
        let err: ExtensionError = InvalidExtensionError::nesting_too_deep("deep").into();
        assert_eq!(err.key(), "deep");
        assert_eq!(err.to_string(), "deep: nesting too deep in `extends`");
    }

    #[test]
    fn test_error_suggestions() {
        assert!(ErrorSuggestions::get("activity_limit_exceeded").is_some());
        assert!(ErrorSuggestions::get("unknown").is_none());
    }
}
