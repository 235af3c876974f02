//! # jobboard-search
//!
//! Job search and indexing pipeline for the jobboard recruiting platform.
//!
//! The crate keeps a derived Tantivy index synchronized with the primary
//! job store and serves ranked, faceted, typo-tolerant job search with
//! aggregations and autocomplete. Job and company records stay owned by
//! their CRUD services; this crate consumes them through the [`store`]
//! traits and propagates mutations through the fire-and-forget
//! [`hooks`].
//!
//! # Example
//!
//! ```no_run
//! use jobboard_search::search::{
//!     IndexManager, JobSearchRequest, JobSearchService, SearchConfig,
//! };
//! use jobboard_search::store::{InMemoryCompanyDirectory, InMemoryJobStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let index = Arc::new(IndexManager::new(SearchConfig::default()).await?);
//!     let service = JobSearchService::new(
//!         index,
//!         Arc::new(InMemoryJobStore::new()),
//!         Arc::new(InMemoryCompanyDirectory::new()),
//!     );
//!
//!     let request = JobSearchRequest::new("rust engineer").with_size(10);
//!     let results = service.search_jobs(&request).await?;
//!     println!("{} matching jobs", results.total);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod search;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
