//! Builds (jobs), their options and the runners that pick them up.

use super::Project;
use crate::timeout::{TimeoutCalculator, TimeoutSource};
use crate::utils::parse_duration;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Error raised when a resolved job hash cannot be turned into build options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("jobs:{job}:{key} {message}")]
pub struct JobConfigError {
    /// Job name.
    pub job: String,
    /// Offending key.
    pub key: String,
    /// What is wrong with it.
    pub message: String,
}

impl JobConfigError {
    fn new(job: &str, key: &str, message: &str) -> Self {
        Self {
            job: job.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

const DURATION: &str = "config should be a duration";
const SCRIPT: &str = "config should be a string or a nested array of strings";
const IMAGE: &str = "config should be a hash or a string";

/// Options of a build derived from its job configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Job-level timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_timeout: Option<u64>,
    /// Script lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<String>,
    /// Image name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl BuildOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the job timeout in seconds.
    #[must_use]
    pub fn with_job_timeout(mut self, seconds: u64) -> Self {
        self.job_timeout = Some(seconds);
        self
    }

    /// Reads options from a resolved job hash.
    ///
    /// `timeout` accepts a number of seconds or a human duration such as
    /// `"1h 30m"`.
    ///
    /// # Errors
    ///
    /// Returns a [`JobConfigError`] naming the job and key that is malformed.
    pub fn from_job_config(
        job: &str,
        config: &Map<String, Value>,
    ) -> Result<Self, JobConfigError> {
        let invalid = |key: &str, message: &str| JobConfigError::new(job, key, message);

        let job_timeout = match config.get("timeout") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_u64().ok_or_else(|| invalid("timeout", DURATION))?),
            Some(Value::String(s)) => {
                Some(parse_duration(s).map_err(|_| invalid("timeout", DURATION))?)
            }
            Some(_) => return Err(invalid("timeout", DURATION)),
        };

        let script = match config.get("script") {
            None => Vec::new(),
            Some(Value::String(line)) => vec![line.clone()],
            Some(Value::Array(lines)) => lines
                .iter()
                .map(|line| {
                    line.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("script", SCRIPT))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(invalid("script", SCRIPT)),
        };

        let image = match config.get("image") {
            None => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(Value::Object(image)) => {
                image.get("name").and_then(Value::as_str).map(str::to_string)
            }
            Some(_) => return Err(invalid("image", IMAGE)),
        };

        Ok(Self {
            job_timeout,
            script,
            image,
        })
    }
}

/// A runner able to execute builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    /// Runner ID.
    pub id: u64,
    /// Maximum timeout the runner enforces, in seconds.
    pub maximum_timeout: Option<u64>,
}

impl Runner {
    /// Creates a runner without a maximum timeout.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            maximum_timeout: None,
        }
    }

    /// Sets the runner maximum timeout in seconds.
    #[must_use]
    pub fn with_maximum_timeout(mut self, seconds: u64) -> Self {
        self.maximum_timeout = Some(seconds);
        self
    }
}

/// A build being queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Build ID.
    pub id: u64,
    /// Job name.
    pub name: String,
    /// Options from the job configuration.
    pub options: BuildOptions,
    /// Owning project.
    pub project: Arc<Project>,
    /// Runner that picked the build up, if any.
    pub runner: Option<Runner>,
}

impl Build {
    /// Creates a build without a runner.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, project: Arc<Project>) -> Self {
        Self {
            id,
            name: name.into(),
            options: BuildOptions::default(),
            project,
            runner: None,
        }
    }

    /// Sets the options.
    #[must_use]
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Assigns a runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Runner) -> Self {
        self.runner = Some(runner);
        self
    }
}

/// Timeout state recorded for a build when it is picked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Applicable timeout in seconds.
    pub timeout: Option<u64>,
    /// Where the timeout came from.
    pub timeout_source: TimeoutSource,
}

impl BuildMetadata {
    /// Records the applicable timeout of `build`.
    ///
    /// Returns true if a timeout applies.
    pub fn update_timeout_state(&mut self, build: &Build) -> bool {
        match TimeoutCalculator::new(build).applicable_timeout() {
            Some(timeout) => {
                self.timeout = Some(timeout.value);
                self.timeout_source = timeout.source;
                true
            }
            None => {
                self.timeout = None;
                self.timeout_source = TimeoutSource::Unknown;
                false
            }
        }
    }
}
