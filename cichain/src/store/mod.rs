//! Persistence and usage counting collaborator.
//!
//! The chain never talks to a database directly. Everything it needs to
//! persist a pipeline or count usage against a quota goes through
//! [`PipelineStore`].

mod memory;

pub use memory::InMemoryPipelineStore;

use crate::entities::{Pipeline, Project};
use crate::utils::Timestamp;
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a pipeline store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The record was changed by someone else since it was read.
    #[error("Stale pipeline {id}: expected lock version {expected}, found {actual}")]
    StaleObject {
        /// Pipeline ID.
        id: u64,
        /// Version held by the caller.
        expected: u64,
        /// Version in the store.
        actual: u64,
    },

    /// The record does not exist.
    #[error("Pipeline not found: {0}")]
    NotFound(String),

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true for optimistic-lock conflicts.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StaleObject { .. })
    }
}

/// Storage backing the pipeline chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Inserts or updates a pipeline.
    ///
    /// New pipelines get an ID. Updates must fail with
    /// [`StoreError::StaleObject`] when `lock_version` does not match the
    /// stored record, and bump it otherwise.
    async fn save(&self, pipeline: &mut Pipeline) -> Result<(), StoreError>;

    /// Replaces `pipeline` with the stored copy.
    async fn reload(&self, pipeline: &mut Pipeline) -> Result<(), StoreError>;

    /// Counts alive pipelines of a project.
    async fn alive_pipelines_count(&self, project: &Project) -> Result<u64, StoreError>;

    /// Counts jobs in alive pipelines of a project created at or after `since`.
    async fn active_jobs_count(
        &self,
        project: &Project,
        since: Timestamp,
    ) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_detection() {
        let stale = StoreError::StaleObject {
            id: 1,
            expected: 2,
            actual: 3,
        };
        assert!(stale.is_conflict());
        assert!(!StoreError::Backend("down".to_string()).is_conflict());
        assert!(stale.to_string().contains("expected lock version 2"));
    }
}
