//! Tenancy types: namespaces, plan limits, projects and users.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ceilings defined by a namespace's plan.
///
/// A value of `0` disables the corresponding limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Maximum number of alive pipelines per project.
    #[serde(default)]
    pub ci_active_pipelines: u64,
    /// Maximum number of jobs in a single pipeline.
    #[serde(default)]
    pub ci_pipeline_size: u64,
    /// Maximum number of jobs in alive pipelines within the activity window.
    #[serde(default)]
    pub ci_active_jobs: u64,
}

impl PlanLimits {
    /// Creates limits with every ceiling disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active pipelines limit.
    #[must_use]
    pub fn with_active_pipelines(mut self, limit: u64) -> Self {
        self.ci_active_pipelines = limit;
        self
    }

    /// Sets the pipeline size limit.
    #[must_use]
    pub fn with_pipeline_size(mut self, limit: u64) -> Self {
        self.ci_pipeline_size = limit;
        self
    }

    /// Sets the active jobs limit.
    #[must_use]
    pub fn with_active_jobs(mut self, limit: u64) -> Self {
        self.ci_active_jobs = limit;
        self
    }
}

/// The group or user namespace that owns projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Namespace ID.
    pub id: u64,
    /// Full path, e.g. `gitlab-org`.
    pub path: String,
    /// Name of the plan the namespace is on.
    pub plan_name: String,
    /// Limits of that plan.
    pub limits: PlanLimits,
}

impl Namespace {
    /// Creates a namespace on the default plan with no limits.
    #[must_use]
    pub fn new(id: u64, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            plan_name: "default".to_string(),
            limits: PlanLimits::default(),
        }
    }

    /// Sets the plan name and its limits.
    #[must_use]
    pub fn with_plan(mut self, plan_name: impl Into<String>, limits: PlanLimits) -> Self {
        self.plan_name = plan_name.into();
        self.limits = limits;
        self
    }
}

/// A project owning pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID.
    pub id: u64,
    /// Project path within the namespace.
    pub path: String,
    /// Owning namespace.
    pub namespace: Arc<Namespace>,
    /// Default build timeout in seconds.
    pub build_timeout: Option<u64>,
}

impl Project {
    /// Creates a project.
    #[must_use]
    pub fn new(id: u64, path: impl Into<String>, namespace: Arc<Namespace>) -> Self {
        Self {
            id,
            path: path.into(),
            namespace,
            build_timeout: None,
        }
    }

    /// Sets the project build timeout in seconds.
    #[must_use]
    pub fn with_build_timeout(mut self, seconds: u64) -> Self {
        self.build_timeout = Some(seconds);
        self
    }

    /// Returns `namespace/path`.
    #[must_use]
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.namespace.path, self.path)
    }

    /// Returns the plan name of the owning namespace.
    #[must_use]
    pub fn plan_name(&self) -> &str {
        &self.namespace.plan_name
    }
}

/// The user creating a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: u64,
    /// Username.
    pub username: String,
}

impl User {
    /// Creates a user.
    #[must_use]
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}
