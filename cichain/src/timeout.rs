//! Build timeout precedence.
//!
//! A build may carry a timeout from its job definition, inherit one from its
//! project, and be capped by the runner that picks it up. The job timeout
//! replaces the project timeout outright; the runner timeout only ever
//! shortens the result.

use crate::entities::Build;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where an applicable timeout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeoutSource {
    /// No timeout applies.
    #[default]
    #[serde(rename = "unknown_timeout_source")]
    Unknown,
    /// The project's build timeout.
    #[serde(rename = "project_timeout_source")]
    Project,
    /// The runner's maximum timeout.
    #[serde(rename = "runner_timeout_source")]
    Runner,
    /// The job's own `timeout:` keyword.
    #[serde(rename = "job_timeout_source")]
    Job,
}

impl fmt::Display for TimeoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown_timeout_source",
            Self::Project => "project_timeout_source",
            Self::Runner => "runner_timeout_source",
            Self::Job => "job_timeout_source",
        };
        write!(f, "{s}")
    }
}

/// A timeout candidate in seconds, tagged with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    /// Timeout in seconds.
    pub value: u64,
    /// Where it came from.
    pub source: TimeoutSource,
}

impl Timeout {
    /// Creates a timeout.
    #[must_use]
    pub fn new(value: u64, source: TimeoutSource) -> Self {
        Self { value, source }
    }

    /// Returns the timeout as a [`Duration`].
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.value)
    }
}

/// Computes the applicable timeout of one build.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutCalculator<'a> {
    build: &'a Build,
}

impl<'a> TimeoutCalculator<'a> {
    /// Creates a calculator for `build`.
    #[must_use]
    pub fn new(build: &'a Build) -> Self {
        Self { build }
    }

    /// Returns the applicable timeout, if any candidate is configured.
    ///
    /// On equal values the job/project candidate is kept.
    #[must_use]
    pub fn applicable_timeout(&self) -> Option<Timeout> {
        match (self.job_or_project_timeout(), self.runner_timeout()) {
            (Some(base), Some(runner)) if runner.value < base.value => Some(runner),
            (Some(base), _) => Some(base),
            (None, runner) => runner,
        }
    }

    /// Job timeout if set, project timeout otherwise.
    #[must_use]
    pub fn job_or_project_timeout(&self) -> Option<Timeout> {
        self.job_timeout().or_else(|| self.project_timeout())
    }

    fn job_timeout(&self) -> Option<Timeout> {
        self.build
            .options
            .job_timeout
            .map(|value| Timeout::new(value, TimeoutSource::Job))
    }

    fn project_timeout(&self) -> Option<Timeout> {
        self.build
            .project
            .build_timeout
            .map(|value| Timeout::new(value, TimeoutSource::Project))
    }

    fn runner_timeout(&self) -> Option<Timeout> {
        self.build
            .runner
            .as_ref()
            .and_then(|runner| runner.maximum_timeout)
            .filter(|value| *value > 0)
            .map(|value| Timeout::new(value, TimeoutSource::Runner))
    }
}
