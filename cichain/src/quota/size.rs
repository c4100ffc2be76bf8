//! Pipeline size quota.

use super::{excess, Limit};
use crate::entities::{Pipeline, Project};
use crate::utils::pluralize;

/// Jobs of the pipeline being created against `ci_pipeline_size`.
///
/// Unlike [`super::Activity`], usage comes from the unsaved pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    limit: u64,
    seeds: u64,
}

impl Size {
    /// Creates the quota from known values.
    #[must_use]
    pub fn new(limit: u64, seeds: u64) -> Self {
        Self { limit, seeds }
    }

    /// Computes the quota for `pipeline` in `project`.
    #[must_use]
    pub fn for_pipeline(project: &Project, pipeline: &Pipeline) -> Self {
        Self::new(
            project.namespace.limits.ci_pipeline_size,
            pipeline.job_count() as u64,
        )
    }

    fn excessive_seeds_count(&self) -> u64 {
        excess(self.seeds, self.limit)
    }
}

impl Limit for Size {
    fn name(&self) -> &'static str {
        "ci_pipeline_size"
    }

    fn enabled(&self) -> bool {
        self.limit > 0
    }

    fn exceeded(&self) -> bool {
        self.enabled() && self.excessive_seeds_count() > 0
    }

    fn message(&self) -> Option<String> {
        self.exceeded().then(|| {
            format!(
                "Pipeline size limit exceeded by {}!",
                pluralize(self.excessive_seeds_count(), "job")
            )
        })
    }
}
