//! Active jobs quota.

use super::{excess, Limit};
use crate::entities::Pipeline;
use crate::store::{PipelineStore, StoreError};
use crate::utils::pluralize;
use chrono::{Duration, Utc};

/// Jobs in recent alive pipelines of a project against `ci_active_jobs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobActivity {
    limit: u64,
    active_jobs: u64,
    window_hours: u32,
}

impl JobActivity {
    /// Creates the quota from known values.
    #[must_use]
    pub fn new(limit: u64, active_jobs: u64, window_hours: u32) -> Self {
        Self {
            limit,
            active_jobs,
            window_hours,
        }
    }

    /// Computes the quota for the project of `pipeline` over the last
    /// `window_hours`, including the jobs of `pipeline` itself when it is
    /// not saved yet.
    pub async fn load(
        store: &dyn PipelineStore,
        pipeline: &Pipeline,
        window_hours: u32,
    ) -> Result<Self, StoreError> {
        let project = &pipeline.project;
        let limit = project.namespace.limits.ci_active_jobs;
        let active_jobs = if limit > 0 {
            let since = Utc::now() - Duration::hours(i64::from(window_hours));
            let stored = store.active_jobs_count(project, since).await?;
            let own = if pipeline.is_candidate() {
                pipeline.job_count() as u64
            } else {
                0
            };
            stored + own
        } else {
            0
        };
        Ok(Self::new(limit, active_jobs, window_hours))
    }

    fn excessive_jobs_count(&self) -> u64 {
        excess(self.active_jobs, self.limit)
    }
}

impl Limit for JobActivity {
    fn name(&self) -> &'static str {
        "ci_active_jobs"
    }

    fn enabled(&self) -> bool {
        self.limit > 0
    }

    fn exceeded(&self) -> bool {
        self.enabled() && self.excessive_jobs_count() > 0
    }

    fn message(&self) -> Option<String> {
        self.exceeded().then(|| {
            format!(
                "Active jobs limit exceeded by {} in the past {} hours!",
                pluralize(self.excessive_jobs_count(), "job"),
                self.window_hours
            )
        })
    }
}
