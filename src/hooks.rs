//! Write-path hooks keeping the search index in sync with the job store
//!
//! The job CRUD service calls these after each successful primary-store
//! mutation. Every hook schedules the index write on a detached task and
//! returns immediately, so index-engine latency or failure can never
//! delay or fail the triggering API response. There is no retry queue: a
//! failed write is logged and the index drifts until the next full
//! reindex. Rapid writes to the same job race with last-write-wins
//! semantics at the index.

use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::Job;
use crate::search::JobSearchService;

/// Fire-and-forget bridge between job mutations and the search index
#[derive(Clone)]
pub struct SearchIndexHooks {
    search: Arc<JobSearchService>,
}

impl SearchIndexHooks {
    pub fn new(search: Arc<JobSearchService>) -> Self {
        Self { search }
    }

    /// Called after a job is created. The returned handle is only there
    /// for tests that want to await completion; callers drop it.
    pub fn job_created(&self, job: Job) -> JoinHandle<()> {
        let search = Arc::clone(&self.search);
        tokio::spawn(async move {
            search.index_job(&job).await;
        })
    }

    /// Called after a job is updated
    pub fn job_updated(&self, job: Job) -> JoinHandle<()> {
        let search = Arc::clone(&self.search);
        tokio::spawn(async move {
            search.update_job_in_index(&job).await;
        })
    }

    /// Called after a job is soft-deleted
    pub fn job_deleted(&self, job_id: Uuid) -> JoinHandle<()> {
        let search = Arc::clone(&self.search);
        tokio::spawn(async move {
            search.delete_job_from_index(&job_id).await;
        })
    }
}
