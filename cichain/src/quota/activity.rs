//! Active pipelines quota.

use super::{excess, Limit};
use crate::entities::Pipeline;
use crate::store::{PipelineStore, StoreError};
use crate::utils::pluralize;

/// Alive pipelines of a project against the plan's `ci_active_pipelines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    limit: u64,
    alive_pipelines: u64,
}

impl Activity {
    /// Creates the quota from known values.
    #[must_use]
    pub fn new(limit: u64, alive_pipelines: u64) -> Self {
        Self {
            limit,
            alive_pipelines,
        }
    }

    /// Computes the quota for the project of `pipeline`.
    ///
    /// An unsaved alive pipeline counts towards usage, as it is about to be
    /// created. Usage is only counted when the limit is enabled.
    pub async fn load(store: &dyn PipelineStore, pipeline: &Pipeline) -> Result<Self, StoreError> {
        let project = &pipeline.project;
        let limit = project.namespace.limits.ci_active_pipelines;
        let alive_pipelines = if limit > 0 {
            let stored = store.alive_pipelines_count(project).await?;
            stored + u64::from(pipeline.is_candidate())
        } else {
            0
        };
        Ok(Self::new(limit, alive_pipelines))
    }

    fn excessive_pipelines_count(&self) -> u64 {
        excess(self.alive_pipelines, self.limit)
    }
}

impl Limit for Activity {
    fn name(&self) -> &'static str {
        "ci_active_pipelines"
    }

    fn enabled(&self) -> bool {
        self.limit > 0
    }

    fn exceeded(&self) -> bool {
        self.enabled() && self.excessive_pipelines_count() > 0
    }

    fn message(&self) -> Option<String> {
        self.exceeded().then(|| {
            format!(
                "Active pipelines limit exceeded by {}!",
                pluralize(self.excessive_pipelines_count(), "pipeline")
            )
        })
    }
}
