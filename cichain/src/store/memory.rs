//! In-memory pipeline store with optimistic locking.

use super::{PipelineStore, StoreError};
use crate::entities::{Pipeline, Project};
use crate::utils::Timestamp;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A [`PipelineStore`] keeping pipelines in a map.
///
/// Conflicts can be injected to simulate concurrent writers: each injected
/// conflict makes one update fail and bumps the stored lock version, as if
/// another process had saved the record first.
#[derive(Debug, Default)]
pub struct InMemoryPipelineStore {
    pipelines: RwLock<HashMap<u64, Pipeline>>,
    next_id: AtomicU64,
    pending_conflicts: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryPipelineStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` updates fail with a stale-object conflict.
    pub fn inject_conflicts(&self, count: usize) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Returns the stored copy of a pipeline.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<Pipeline> {
        self.pipelines.read().get(&id).cloned()
    }

    /// Returns the number of stored pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.read().is_empty()
    }

    /// Returns the number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PipelineStore for InMemoryPipelineStore {
    async fn save(&self, pipeline: &mut Pipeline) -> Result<(), StoreError> {
        let mut pipelines = self.pipelines.write();

        let Some(id) = pipeline.id else {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            pipeline.id = Some(id);
            pipelines.insert(id, pipeline.clone());
            self.saves.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        };

        let stored = pipelines
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if self.take_conflict() {
            stored.lock_version += 1;
        }

        if stored.lock_version != pipeline.lock_version {
            return Err(StoreError::StaleObject {
                id,
                expected: pipeline.lock_version,
                actual: stored.lock_version,
            });
        }

        pipeline.lock_version += 1;
        *stored = pipeline.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self, pipeline: &mut Pipeline) -> Result<(), StoreError> {
        let id = pipeline
            .id
            .ok_or_else(|| StoreError::NotFound("unsaved pipeline".to_string()))?;
        let stored = self
            .pipelines
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        *pipeline = stored;
        Ok(())
    }

    async fn alive_pipelines_count(&self, project: &Project) -> Result<u64, StoreError> {
        let count = self
            .pipelines
            .read()
            .values()
            .filter(|p| p.project.id == project.id && p.status.is_alive())
            .count();
        Ok(count as u64)
    }

    async fn active_jobs_count(
        &self,
        project: &Project,
        since: Timestamp,
    ) -> Result<u64, StoreError> {
        let count: usize = self
            .pipelines
            .read()
            .values()
            .filter(|p| p.project.id == project.id && p.status.is_alive() && p.created_at >= since)
            .map(Pipeline::job_count)
            .sum();
        Ok(count as u64)
    }
}
