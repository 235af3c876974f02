//! Full-text job search powered by Tantivy
//!
//! This module keeps a derived search index synchronized with the primary
//! job store and serves the user-facing search surface:
//!
//! - **Full-Text Search**: weighted multi-field matching with typo
//!   tolerance across titles, descriptions, skills, company names and
//!   locations
//! - **Faceted Search**: filter by employment type, experience level,
//!   location type, skills, salary and company
//! - **Aggregations**: bucket counts for every facet on every search
//! - **Autocomplete**: prefix/substring/fuzzy suggestions per field
//! - **Asynchronous Indexing**: job mutations propagate to the index on
//!   detached tasks, never blocking the primary write
//! - **Full Reindex**: destructive rebuild from the system of record
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           JobSearchService (facade)              │
//! ├─────────────────────────────────────────────────┤
//! │  - search_jobs()       - suggest()              │
//! │  - reindex_all_jobs()  - popular_search_terms() │
//! │  - index_job() / update / delete (write hooks)  │
//! └─────────────────────────────────────────────────┘
//!            │                        │
//!            ▼                        ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │     QueryBuilder      │  │     IndexManager     │
//! ├──────────────────────┤  ├──────────────────────┤
//! │  request → boolean    │  │  schema + analyzers  │
//! │  tree, sorts, aggs    │  │  writer / reader     │
//! └──────────────────────┘  │  upsert / bulk / drop │
//!                           └──────────────────────┘
//!                                      │
//!                                      ▼
//!                           ┌──────────────────────┐
//!                           │    Tantivy Index     │
//!                           └──────────────────────┘
//! ```
//!
//! The index is derived state: the job store stays the source of truth,
//! write failures are swallowed on the hot path, and a full reindex is
//! the reconciliation mechanism.

mod config;
mod document;
mod error;
mod index;
mod query;
mod schema;
mod service;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::JobDocument;
pub use error::{SearchError, SearchResult};
pub use index::{IndexManager, IndexStats, JobIndexWriter};
pub use query::{JobSearchRequest, JobSortBy, QueryBuilder, SuggestField};
pub use schema::{build_jobs_schema, register_analyzers, JobFields};
pub use service::{
    AggregationBucket, JobAggregations, JobSearchResponse, JobSearchService, JobSuggestion,
    PopularSearchTerms, SearchedJob,
};
