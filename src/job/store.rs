//! Job storage.
//!
//! The orchestrator only needs atomic read-modify-write per job. Durable
//! backends implement [`JobStore`]; [`InMemoryJobStore`] keeps everything in
//! process with one mutex per job so unrelated jobs never contend.

use super::error::JobError;
use super::record::{Job, JobId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Keyed job storage with per-job atomic updates.
pub trait JobStore: Send + Sync {
    /// Allocates a fresh identifier.
    fn next_id(&self) -> JobId;

    /// Stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::DuplicateId`] when the identifier is taken.
    fn insert(&self, job: Job) -> Result<(), JobError>;

    /// Returns a snapshot of the job.
    fn get(&self, id: JobId) -> Option<Job>;

    /// Runs `f` with exclusive access to the job, returning its result, or
    /// `None` when the job does not exist.
    fn with_job<R, F>(&self, id: JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Job) -> R;
}

/// Process-local job store.
#[derive(Debug)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<Job>>>>,
    next: AtomicU64,
}

impl InMemoryJobStore {
    /// An empty store whose first identifier is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    /// Number of stored jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    /// Whether the store holds no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    fn slot(&self, id: JobId) -> Option<Arc<Mutex<Job>>> {
        self.jobs.read().get(&id).cloned()
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for InMemoryJobStore {
    fn next_id(&self) -> JobId {
        JobId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, job: Job) -> Result<(), JobError> {
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&job.id) {
            return Err(JobError::DuplicateId { id: job.id });
        }
        jobs.insert(job.id, Arc::new(Mutex::new(job)));
        Ok(())
    }

    fn get(&self, id: JobId) -> Option<Job> {
        self.slot(id).map(|slot| slot.lock().clone())
    }

    fn with_job<R, F>(&self, id: JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Job) -> R,
    {
        // Release the map lock before taking the job lock.
        let slot = self.slot(id)?;
        let mut job = slot.lock();
        Some(f(&mut job))
    }
}

impl<T: JobStore> JobStore for Arc<T> {
    fn next_id(&self) -> JobId {
        (**self).next_id()
    }

    fn insert(&self, job: Job) -> Result<(), JobError> {
        (**self).insert(job)
    }

    fn get(&self, id: JobId) -> Option<Job> {
        (**self).get(id)
    }

    fn with_job<R, F>(&self, id: JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Job) -> R,
    {
        (**self).with_job(id, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use serde_json::Map;

    #[fixture]
    fn store() -> InMemoryJobStore {
        InMemoryJobStore::new()
    }

    fn job(id: JobId) -> Job {
        Job::new(id, "readnfo", Map::new(), "tester", Utc::now())
    }

    #[rstest]
    fn identifiers_are_unique(store: InMemoryJobStore) {
        let a = store.next_id();
        let b = store.next_id();

        assert_ne!(a, b);
        assert_eq!(a.get(), 1);
    }

    #[rstest]
    fn duplicate_ids_are_rejected(store: InMemoryJobStore) {
        let id = store.next_id();
        store.insert(job(id)).expect("first insert");

        assert_eq!(store.insert(job(id)), Err(JobError::DuplicateId { id }));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn updates_are_visible_in_snapshots(store: InMemoryJobStore) {
        let id = store.next_id();
        store.insert(job(id)).expect("insert");

        let seen = store.with_job(id, |j| {
            j.status = JobStatus::Running;
            j.status
        });

        assert_eq!(seen, Some(JobStatus::Running));
        assert_eq!(store.get(id).map(|j| j.status), Some(JobStatus::Running));
    }

    #[rstest]
    fn missing_jobs_yield_none(store: InMemoryJobStore) {
        assert!(store.get(JobId::new(99)).is_none());
        assert!(store.with_job(JobId::new(99), |_| ()).is_none());
        assert!(store.is_empty());
    }
}
