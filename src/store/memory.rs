use crate::error::Result;
use crate::models::{Company, Job};
use crate::store::{CompanyDirectory, JobStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory job store (for tests and standalone demos)
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<DashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a job record
    pub fn save_job(&self, job: Job) {
        tracing::debug!(job_id = %job.id, "job saved");
        self.jobs.insert(job.id, job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .iter()
            .filter(|entry| !entry.is_deleted)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn get_job(&self, id: &Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.get(id).map(|entry| entry.clone()))
    }
}

/// In-memory company directory (for tests and standalone demos)
#[derive(Clone, Default)]
pub struct InMemoryCompanyDirectory {
    companies: Arc<DashMap<Uuid, Company>>,
}

impl InMemoryCompanyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_company(&self, company: Company) {
        self.companies.insert(company.id, company);
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryCompanyDirectory {
    async fn get_company(&self, id: &Uuid) -> Result<Option<Company>> {
        Ok(self.companies.get(id).map(|entry| entry.clone()))
    }

    async fn get_companies(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Company>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.companies.get(id).map(|entry| (*id, entry.clone())))
            .collect())
    }
}
