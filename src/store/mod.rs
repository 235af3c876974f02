//! Interfaces to the primary stores the search subsystem reads from.
//!
//! Job and company records are owned by external CRUD services backed by
//! the document database; search only consumes them. Both interfaces are
//! traits so the reindex and write paths can be exercised against
//! in-memory doubles.

pub mod memory;

pub use memory::{InMemoryCompanyDirectory, InMemoryJobStore};

use crate::error::Result;
use crate::models::{Company, Job};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Read access to the primary job store
#[async_trait]
pub trait JobStore: Send + Sync {
    /// All non-deleted jobs, active or not. Feeds the full reindex.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    /// Fetch a job by id
    async fn get_job(&self, id: &Uuid) -> Result<Option<Job>>;
}

/// Company name resolution
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// Fetch a company by id
    async fn get_company(&self, id: &Uuid) -> Result<Option<Company>>;

    /// Batched lookup; ids without a company are absent from the result
    async fn get_companies(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Company>>;
}
