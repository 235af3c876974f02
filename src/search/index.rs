//! Jobs index lifecycle and write operations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::query::AllQuery;
use tantivy::schema::Schema;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tokio::sync::RwLock;

use crate::search::config::SearchConfig;
use crate::search::document::JobDocument;
use crate::search::error::{SearchError, SearchResult};
use crate::search::schema::{build_jobs_schema, register_analyzers, JobFields};

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Write operations against the jobs index.
///
/// Kept as a seam separate from the read side so the write path can be
/// exercised against a stubbed sink (an unreachable-index double) in
/// tests. Every operation keys the document by job id, which makes
/// upserts idempotent and reindexing safe to repeat.
#[async_trait]
pub trait JobIndexWriter: Send + Sync {
    /// Insert or replace the document for a job
    async fn upsert(&self, doc: &JobDocument) -> SearchResult<()>;

    /// Index a batch under a single commit. Documents that fail to encode
    /// are logged and skipped rather than aborting the batch; returns how
    /// many were indexed.
    async fn bulk_upsert(&self, docs: &[JobDocument]) -> SearchResult<usize>;

    /// Remove a job's document. Removing an absent document is not an
    /// error.
    async fn remove(&self, job_id: &str) -> SearchResult<()>;

    /// Drop every document and start the index over. Destructive; must
    /// only run from the administrative reindex path, never concurrently
    /// with serving traffic.
    async fn recreate(&self) -> SearchResult<()>;
}

/// Manages the Tantivy jobs index
pub struct IndexManager {
    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Resolved field handles
    fields: JobFields,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader
    reader: IndexReader,

    /// Configuration
    config: SearchConfig,
}

impl IndexManager {
    /// Open the index at the configured path, creating it if needed
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexInitFailed(format!("failed to create index directory: {e}"))
        })?;

        let schema = build_jobs_schema();

        let index = if Self::index_exists(&config.index_path) {
            Index::open_in_dir(&config.index_path).map_err(|e| {
                SearchError::IndexInitFailed(format!("failed to open existing index: {e}"))
            })?
        } else {
            Index::create_in_dir(&config.index_path, schema.clone()).map_err(|e| {
                SearchError::IndexInitFailed(format!("failed to create new index: {e}"))
            })?
        };

        register_analyzers(&index);

        // the on-disk schema is authoritative when reopening
        let schema = index.schema();
        let fields = JobFields::resolve(&schema)?;

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("failed to create writer: {e}")))?;

        // Reloaded explicitly after every commit; readers always see the
        // last committed state
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("failed to create reader: {e}")))?;

        Ok(Self {
            index,
            schema,
            fields,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            config,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the resolved field handles
    pub fn fields(&self) -> &JobFields {
        &self.fields
    }

    /// Get the reader
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Get the configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn refresh_reader(&self) -> SearchResult<()> {
        self.reader
            .reload()
            .map_err(|e| SearchError::IndexingFailed(format!("failed to refresh reader: {e}")))
    }

    /// Get index statistics
    pub async fn stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        let total_documents = searcher
            .search(&AllQuery, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("failed to count documents: {e}")))?
            as u64;

        let num_segments = searcher.segment_readers().len();

        let index_size_bytes = std::fs::read_dir(&self.config.index_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents,
            index_size_bytes,
            num_segments,
        })
    }
}

#[async_trait]
impl JobIndexWriter for IndexManager {
    async fn upsert(&self, doc: &JobDocument) -> SearchResult<()> {
        let tantivy_doc = doc.to_tantivy_doc(&self.fields);

        let mut writer = self.writer.write().await;

        // Delete any existing document with the same job id first
        writer.delete_term(Term::from_field_text(self.fields.id, doc.document_id()));

        writer
            .add_document(tantivy_doc)
            .map_err(|e| SearchError::IndexingFailed(format!("failed to add document: {e}")))?;

        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("failed to commit document: {e}")))?;
        drop(writer);

        self.refresh_reader()?;
        tracing::debug!(job_id = %doc.id, "job document indexed");
        Ok(())
    }

    async fn bulk_upsert(&self, docs: &[JobDocument]) -> SearchResult<usize> {
        let mut writer = self.writer.write().await;
        let mut indexed = 0;

        for doc in docs {
            let tantivy_doc = doc.to_tantivy_doc(&self.fields);

            writer.delete_term(Term::from_field_text(self.fields.id, doc.document_id()));

            match writer.add_document(tantivy_doc) {
                Ok(_) => indexed += 1,
                Err(e) => {
                    tracing::error!(job_id = %doc.id, error = %e, "bulk indexing skipped document")
                }
            }
        }

        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("failed to commit batch: {e}")))?;
        drop(writer);

        self.refresh_reader()?;
        tracing::info!(indexed, total = docs.len(), "bulk indexed job documents");
        Ok(indexed)
    }

    async fn remove(&self, job_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.id, job_id));
        writer
            .commit()
            .map_err(|e| SearchError::DeletionFailed(format!("failed to commit deletion: {e}")))?;
        drop(writer);

        self.refresh_reader()?;
        tracing::debug!(job_id, "job document removed");
        Ok(())
    }

    async fn recreate(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        writer
            .delete_all_documents()
            .map_err(|e| SearchError::IndexInitFailed(format!("failed to clear index: {e}")))?;
        writer
            .commit()
            .map_err(|e| SearchError::IndexInitFailed(format!("failed to commit clear: {e}")))?;
        drop(writer);

        self.refresh_reader()?;
        tracing::info!("jobs index recreated");
        Ok(())
    }
}
