//! Builders for projects and pipelines used in tests.

use std::sync::Arc;

use crate::entities::{Namespace, Pipeline, PlanLimits, Project, StageSeed};

/// A project builder.
#[derive(Debug, Clone)]
pub struct TestProject {
    id: u64,
    path: String,
    plan_name: String,
    limits: PlanLimits,
    build_timeout: Option<u64>,
}

impl Default for TestProject {
    fn default() -> Self {
        Self {
            id: 1,
            path: "project".to_string(),
            plan_name: "default".to_string(),
            limits: PlanLimits::default(),
            build_timeout: None,
        }
    }
}

impl TestProject {
    /// Creates a project on a plan without limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project ID.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Sets the project path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the plan name.
    #[must_use]
    pub fn with_plan_name(mut self, plan_name: impl Into<String>) -> Self {
        self.plan_name = plan_name.into();
        self
    }

    /// Sets the plan limits.
    #[must_use]
    pub fn with_limits(mut self, limits: PlanLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the project build timeout in seconds.
    #[must_use]
    pub fn with_build_timeout(mut self, seconds: u64) -> Self {
        self.build_timeout = Some(seconds);
        self
    }

    /// Builds the project inside its own namespace.
    #[must_use]
    pub fn build(self) -> Arc<Project> {
        let namespace = Namespace::new(self.id, "group").with_plan(self.plan_name, self.limits);
        let mut project = Project::new(self.id, self.path, Arc::new(namespace));
        project.build_timeout = self.build_timeout;
        Arc::new(project)
    }
}

/// Creates an unsaved pipeline with one stage holding `jobs` jobs.
#[must_use]
pub fn pipeline_with_jobs(project: Arc<Project>, jobs: usize) -> Pipeline {
    let names: Vec<String> = (1..=jobs).map(|i| format!("job{i}")).collect();
    Pipeline::new(project, "main", "a1b2c3d4").with_stages(vec![StageSeed::new("test", names)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_defaults() {
        let project = TestProject::new().build();
        assert_eq!(project.id, 1);
        assert_eq!(project.plan_name(), "default");
        assert_eq!(project.namespace.limits, PlanLimits::default());
        assert!(project.build_timeout.is_none());
    }

    #[test]
    fn test_project_builder() {
        let project = TestProject::new()
            .with_id(7)
            .with_path("api")
            .with_plan_name("ultimate")
            .with_limits(PlanLimits::new().with_pipeline_size(5))
            .with_build_timeout(600)
            .build();

        assert_eq!(project.full_path(), "group/api");
        assert_eq!(project.plan_name(), "ultimate");
        assert_eq!(project.namespace.limits.ci_pipeline_size, 5);
        assert_eq!(project.build_timeout, Some(600));
    }

    #[test]
    fn test_pipeline_with_jobs() {
        let pipeline = pipeline_with_jobs(TestProject::new().build(), 4);
        assert_eq!(pipeline.job_count(), 4);
    }
}
