//! Plan quotas checked while creating a pipeline.
//!
//! A quota is computed once from the namespace's plan limits and current
//! usage, then only answers questions. A limit value of `0` disables it.

mod activity;
mod job_activity;
mod size;

pub use activity::Activity;
pub use job_activity::JobActivity;
pub use size::Size;

use crate::entities::Project;
use tracing::warn;

/// A computed quota.
pub trait Limit {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if the plan sets this limit.
    fn enabled(&self) -> bool;

    /// Returns true if usage is over the limit.
    fn exceeded(&self) -> bool;

    /// Human-readable description of the excess, if exceeded.
    fn message(&self) -> Option<String>;

    /// Reports an exceeded limit.
    fn log_error(&self, project: &Project) {
        if let Some(message) = self.message() {
            warn!(
                limit = self.name(),
                project_id = project.id,
                plan = project.plan_name(),
                "{}", message
            );
        }
    }
}

/// Usage above `limit`, or zero when the limit is disabled or not reached.
pub(crate) fn excess(usage: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        usage.saturating_sub(limit)
    }
}
