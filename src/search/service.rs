//! Main search service implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tantivy::aggregation::agg_result::AggregationResults;
use tantivy::aggregation::{AggregationCollector, AggregationLimits};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::Query;
use tantivy::schema::{Field, Value};
use tantivy::{DocAddress, DocId, Order, Searcher, SegmentReader, TantivyDocument};
use uuid::Uuid;

use crate::models::{EmploymentType, ExperienceLevel, Job, LocationType};
use crate::search::document::JobDocument;
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{IndexManager, IndexStats, JobIndexWriter};
use crate::search::query::{JobSearchRequest, JobSortBy, QueryBuilder, SuggestField};
use crate::store::{CompanyDirectory, JobStore};

/// A single ranked job hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchedJob {
    pub id: String,
    pub title: String,
    pub description: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub location_type: LocationType,
    pub location: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub salary_currency: String,
    pub skills: Vec<String>,
    pub company_id: String,
    pub company_name: Option<String>,
    pub recruiter_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub apply_url: Option<String>,
    pub salary_range: String,

    /// Relevance score; absent under explicit field sorts
    pub score: Option<f32>,
}

/// One facet bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub key: String,
    pub doc_count: u64,
}

/// Facet buckets computed over the filtered result set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobAggregations {
    pub locations: Vec<AggregationBucket>,
    pub employment_types: Vec<AggregationBucket>,
    pub experience_levels: Vec<AggregationBucket>,
    pub location_types: Vec<AggregationBucket>,
    pub skills: Vec<AggregationBucket>,
    pub salary_ranges: Vec<AggregationBucket>,
}

/// Search response with results, pagination metadata and facets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSearchResponse {
    pub jobs: Vec<SearchedJob>,
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub total_pages: usize,
    pub aggregations: JobAggregations,
}

/// Autocomplete suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSuggestion {
    pub text: String,
    pub score: f32,
}

/// Most common filter values across live postings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopularSearchTerms {
    pub popular_locations: Vec<AggregationBucket>,
    pub popular_skills: Vec<AggregationBucket>,
    pub employment_types: Vec<AggregationBucket>,
    pub experience_levels: Vec<AggregationBucket>,
    pub location_types: Vec<AggregationBucket>,
}

/// Facade over the jobs index: the only entry point other subsystems use
/// for searching, suggesting and synchronizing.
///
/// Failure domains are deliberately split. Reads surface errors (a broken
/// search must not render as "no results"), suggestions degrade to empty,
/// and write-path synchronization swallows everything: the job store is
/// the source of truth and the index catches up at the next reindex.
pub struct JobSearchService {
    index: Arc<IndexManager>,
    writer: Arc<dyn JobIndexWriter>,
    jobs: Arc<dyn JobStore>,
    companies: Arc<dyn CompanyDirectory>,
}

impl JobSearchService {
    pub fn new(
        index: Arc<IndexManager>,
        jobs: Arc<dyn JobStore>,
        companies: Arc<dyn CompanyDirectory>,
    ) -> Self {
        let writer: Arc<dyn JobIndexWriter> = index.clone();
        Self {
            index,
            writer,
            jobs,
            companies,
        }
    }

    /// Swap the index write seam; lets tests drive the write path against
    /// a failing sink
    pub fn with_index_writer(mut self, writer: Arc<dyn JobIndexWriter>) -> Self {
        self.writer = writer;
        self
    }

    fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.index.index().clone(), *self.index.fields())
    }

    /// Execute a search request: ranked hits, total count, pagination
    /// metadata and facet buckets
    pub async fn search_jobs(&self, request: &JobSearchRequest) -> SearchResult<JobSearchResponse> {
        let size = request.size.clamp(1, self.index.config().max_results);
        let page = request.page.max(1);
        let offset = (page - 1) * size;

        let builder = self.query_builder();
        let query = builder.build(request)?;

        let searcher = self.index.reader().searcher();

        let ranked = collect_hits(&searcher, &*query, request, size, offset)?;

        let total = searcher
            .search(&*query, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("count failed: {e}")))?;

        let aggregations = self.collect_aggregations(&searcher, &*query, &builder)?;

        let mut jobs = Vec::with_capacity(ranked.len());
        for (score, address) in ranked {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| SearchError::SearchFailed(format!("failed to load hit: {e}")))?;
            jobs.push(self.doc_to_job(&doc, score)?);
        }

        Ok(JobSearchResponse {
            jobs,
            total,
            page,
            size,
            total_pages: total.div_ceil(size),
            aggregations,
        })
    }

    /// Autocomplete values for a suggestible field. Degrades to an empty
    /// list on failure: a broken suggester must never block the search box.
    pub async fn suggest(&self, query: &str, field: SuggestField) -> Vec<JobSuggestion> {
        match self.run_suggest(query, field) {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, field = %field, "job suggestions failed");
                Vec::new()
            }
        }
    }

    fn run_suggest(&self, query_text: &str, field: SuggestField) -> SearchResult<Vec<JobSuggestion>> {
        let builder = self.query_builder();
        let query = builder.suggest_query(query_text, field)?;

        let searcher = self.index.reader().searcher();
        let scan_size = self.index.config().suggestion_scan_size.max(1);
        let top = searcher
            .search(&*query, &TopDocs::with_limit(scan_size))
            .map_err(|e| SearchError::SearchFailed(format!("suggestion search failed: {e}")))?;

        let fields = self.index.fields();
        let value_field = match field {
            SuggestField::Title => fields.title,
            SuggestField::Location => fields.location,
            SuggestField::Skills => fields.skills,
            SuggestField::CompanyName => fields.company_name,
        };

        let needle = query_text.trim().to_lowercase();
        let limit = self.index.config().suggestion_limit;
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for (_score, address) in top {
            if suggestions.len() >= limit {
                break;
            }
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| SearchError::SearchFailed(format!("failed to load hit: {e}")))?;

            match field {
                // multi-valued: expand, keep only values containing the
                // query, then dedup
                SuggestField::Skills => {
                    for skill in multi_text_values(&doc, value_field) {
                        if suggestions.len() >= limit {
                            break;
                        }
                        if skill.to_lowercase().contains(&needle)
                            && seen.insert(skill.to_lowercase())
                        {
                            suggestions.push(JobSuggestion {
                                text: skill,
                                score: 1.0,
                            });
                        }
                    }
                }
                _ => {
                    if let Some(value) = text_value(&doc, value_field) {
                        if seen.insert(value.to_lowercase()) {
                            suggestions.push(JobSuggestion {
                                text: value,
                                score: 1.0,
                            });
                        }
                    }
                }
            }
        }

        Ok(suggestions)
    }

    /// Rebuild the index from the system of record. Destructive and loud:
    /// the one search operation allowed to fail its caller. Authorization
    /// (admin only) is enforced by the caller.
    pub async fn reindex_all_jobs(&self) -> SearchResult<bool> {
        tracing::info!("starting full job reindex");

        let jobs = self
            .jobs
            .list_jobs()
            .await
            .map_err(|e| SearchError::ReindexFailed(format!("loading jobs: {e}")))?;

        if jobs.is_empty() {
            tracing::info!("no jobs found to index");
            return Ok(true);
        }

        // one lookup per distinct company
        let mut company_ids: Vec<Uuid> = jobs.iter().map(|job| job.company_id).collect();
        company_ids.sort_unstable();
        company_ids.dedup();

        let companies = self
            .companies
            .get_companies(&company_ids)
            .await
            .map_err(|e| SearchError::ReindexFailed(format!("loading companies: {e}")))?;

        self.writer.recreate().await?;

        let documents: Vec<JobDocument> = jobs
            .iter()
            .map(|job| {
                let company_name = companies.get(&job.company_id).map(|c| c.name.as_str());
                JobDocument::from_job(job, company_name)
            })
            .collect();

        let indexed = self.writer.bulk_upsert(&documents).await?;
        tracing::info!(indexed, total = jobs.len(), "full job reindex finished");
        Ok(true)
    }

    /// Index a newly created job. Never fails the caller: any error is
    /// logged and dropped, and the index drifts until the next reindex.
    pub async fn index_job(&self, job: &Job) {
        if let Err(e) = self.upsert_job(job).await {
            tracing::error!(
                target: "jobboard_search::sync",
                job_id = %job.id,
                op = "index",
                error = %e,
                "index write dropped"
            );
        }
    }

    /// Re-index an updated job. Same swallow-everything contract as
    /// [`index_job`](Self::index_job).
    pub async fn update_job_in_index(&self, job: &Job) {
        if let Err(e) = self.upsert_job(job).await {
            tracing::error!(
                target: "jobboard_search::sync",
                job_id = %job.id,
                op = "update",
                error = %e,
                "index write dropped"
            );
        }
    }

    /// Remove a deleted job's document. Never fails the caller.
    pub async fn delete_job_from_index(&self, job_id: &Uuid) {
        if let Err(e) = self.writer.remove(&job_id.to_string()).await {
            tracing::error!(
                target: "jobboard_search::sync",
                job_id = %job_id,
                op = "delete",
                error = %e,
                "index write dropped"
            );
        }
    }

    async fn upsert_job(&self, job: &Job) -> SearchResult<()> {
        let company = self
            .companies
            .get_company(&job.company_id)
            .await
            .map_err(|e| SearchError::IndexingFailed(format!("company lookup: {e}")))?;

        let doc = JobDocument::from_job(job, company.as_ref().map(|c| c.name.as_str()));
        self.writer.upsert(&doc).await
    }

    /// Most common locations, skills and categories across live postings.
    /// Best-effort: an unavailable index yields empty lists.
    pub async fn popular_search_terms(&self) -> PopularSearchTerms {
        let request = JobSearchRequest {
            size: 1, // only the aggregations matter
            ..Default::default()
        };

        match self.search_jobs(&request).await {
            Ok(results) => {
                let mut aggs = results.aggregations;
                aggs.locations.truncate(10);
                aggs.skills.truncate(15);
                PopularSearchTerms {
                    popular_locations: aggs.locations,
                    popular_skills: aggs.skills,
                    employment_types: aggs.employment_types,
                    experience_levels: aggs.experience_levels,
                    location_types: aggs.location_types,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load popular search terms");
                PopularSearchTerms::default()
            }
        }
    }

    /// Get index statistics
    pub async fn stats(&self) -> SearchResult<IndexStats> {
        self.index.stats().await
    }

    fn collect_aggregations(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        builder: &QueryBuilder,
    ) -> SearchResult<JobAggregations> {
        let agg_request = builder.aggregations()?;
        let collector = AggregationCollector::from_aggs(agg_request, AggregationLimits::default());

        let results: AggregationResults = searcher
            .search(query, &collector)
            .map_err(|e| SearchError::SearchFailed(format!("aggregation failed: {e}")))?;

        let raw = serde_json::to_value(results)
            .map_err(|e| SearchError::SearchFailed(format!("aggregation decode: {e}")))?;

        Ok(JobAggregations {
            locations: buckets(&raw, "locations"),
            employment_types: buckets(&raw, "employment_types"),
            experience_levels: buckets(&raw, "experience_levels"),
            location_types: buckets(&raw, "location_types"),
            skills: buckets(&raw, "skills"),
            salary_ranges: buckets(&raw, "salary_ranges"),
        })
    }

    /// Convert a stored document back into a search hit
    fn doc_to_job(&self, doc: &TantivyDocument, score: Option<f32>) -> SearchResult<SearchedJob> {
        let fields = self.index.fields();

        let employment_type = required_text(doc, fields.employment_type, "employment_type")?
            .parse::<EmploymentType>()
            .map_err(|_| corrupted("employment_type"))?;
        let experience_level = required_text(doc, fields.experience_level, "experience_level")?
            .parse::<ExperienceLevel>()
            .map_err(|_| corrupted("experience_level"))?;
        let location_type = required_text(doc, fields.location_type, "location_type")?
            .parse::<LocationType>()
            .map_err(|_| corrupted("location_type"))?;

        Ok(SearchedJob {
            id: required_text(doc, fields.id, "id")?,
            title: required_text(doc, fields.title, "title")?,
            description: required_text(doc, fields.description, "description")?,
            employment_type,
            experience_level,
            location_type,
            location: required_text(doc, fields.location, "location")?,
            salary_min: u64_value(doc, fields.salary_min).map(|v| v as u32),
            salary_max: u64_value(doc, fields.salary_max).map(|v| v as u32),
            salary_currency: required_text(doc, fields.salary_currency, "salary_currency")?,
            skills: multi_text_values(doc, fields.skills),
            company_id: required_text(doc, fields.company_id, "company_id")?,
            company_name: text_value(doc, fields.company_name),
            recruiter_id: required_text(doc, fields.recruiter_id, "recruiter_id")?,
            is_active: bool_value(doc, fields.is_active).unwrap_or(true),
            created_at: date_value(doc, fields.created_at).ok_or_else(|| corrupted("created_at"))?,
            updated_at: date_value(doc, fields.updated_at).ok_or_else(|| corrupted("updated_at"))?,
            apply_url: text_value(doc, fields.apply_url),
            salary_range: required_text(doc, fields.salary_range, "salary_range")?,
            score,
        })
    }
}

/// Run the top-docs collection under the request's sort mode
fn collect_hits(
    searcher: &Searcher,
    query: &dyn Query,
    request: &JobSearchRequest,
    size: usize,
    offset: usize,
) -> SearchResult<Vec<(Option<f32>, DocAddress)>> {
    let top = TopDocs::with_limit(size).and_offset(offset);

    // relevance scoring is meaningless against match-everything
    let sort = if request.sort_by == JobSortBy::Relevance && !request.has_text_query() {
        JobSortBy::DateDesc
    } else {
        request.sort_by
    };

    let hits = match sort {
        JobSortBy::Relevance => searcher
            .search(query, &top)
            .map_err(|e| SearchError::SearchFailed(format!("search failed: {e}")))?
            .into_iter()
            .map(|(score, address)| (Some(score), address))
            .collect(),
        JobSortBy::DateDesc => searcher
            .search(
                query,
                &top.order_by_fast_field::<tantivy::DateTime>("created_at", Order::Desc),
            )
            .map_err(|e| SearchError::SearchFailed(format!("search failed: {e}")))?
            .into_iter()
            .map(|(_, address)| (None, address))
            .collect(),
        JobSortBy::DateAsc => searcher
            .search(
                query,
                &top.order_by_fast_field::<tantivy::DateTime>("created_at", Order::Asc),
            )
            .map_err(|e| SearchError::SearchFailed(format!("search failed: {e}")))?
            .into_iter()
            .map(|(_, address)| (None, address))
            .collect(),
        JobSortBy::SalaryDesc => searcher
            .search(query, &top.custom_score(salary_desc_key))
            .map_err(|e| SearchError::SearchFailed(format!("search failed: {e}")))?
            .into_iter()
            .map(|(_, address): ((u64, u64), DocAddress)| (None, address))
            .collect(),
        JobSortBy::SalaryAsc => searcher
            .search(query, &top.custom_score(salary_asc_key))
            .map_err(|e| SearchError::SearchFailed(format!("search failed: {e}")))?
            .into_iter()
            .map(|(_, address): ((u64, u64), DocAddress)| (None, address))
            .collect(),
    };

    Ok(hits)
}

/// Highest pay first: upper bound, then lower bound. Missing bounds key
/// to zero and sink to the bottom of the descending order.
fn salary_desc_key(segment_reader: &SegmentReader) -> impl Fn(DocId) -> (u64, u64) {
    let max_column = segment_reader.fast_fields().u64("salary_max").ok();
    let min_column = segment_reader.fast_fields().u64("salary_min").ok();

    move |doc| {
        let max = max_column.as_ref().and_then(|c| c.first(doc)).unwrap_or(0);
        let min = min_column.as_ref().and_then(|c| c.first(doc)).unwrap_or(0);
        (max, min)
    }
}

/// Lowest pay first: lower bound, then upper bound. The collector ranks
/// descending, so present bounds are inverted and missing ones key to
/// zero, which keeps unspecified salaries last.
fn salary_asc_key(segment_reader: &SegmentReader) -> impl Fn(DocId) -> (u64, u64) {
    let min_column = segment_reader.fast_fields().u64("salary_min").ok();
    let max_column = segment_reader.fast_fields().u64("salary_max").ok();

    move |doc| {
        let min = min_column
            .as_ref()
            .and_then(|c| c.first(doc))
            .map(|v| u64::MAX - v)
            .unwrap_or(0);
        let max = max_column
            .as_ref()
            .and_then(|c| c.first(doc))
            .map(|v| u64::MAX - v)
            .unwrap_or(0);
        (min, max)
    }
}

fn corrupted(field: &str) -> SearchError {
    SearchError::IndexCorruption(format!("stored document missing or invalid: {field}"))
}

fn required_text(doc: &TantivyDocument, field: Field, name: &str) -> SearchResult<String> {
    text_value(doc, field).ok_or_else(|| corrupted(name))
}

fn text_value(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn multi_text_values(doc: &TantivyDocument, field: Field) -> Vec<String> {
    doc.get_all(field)
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect()
}

fn u64_value(doc: &TantivyDocument, field: Field) -> Option<u64> {
    doc.get_first(field).and_then(|v| v.as_u64())
}

fn bool_value(doc: &TantivyDocument, field: Field) -> Option<bool> {
    doc.get_first(field).and_then(|v| v.as_bool())
}

fn date_value(doc: &TantivyDocument, field: Field) -> Option<DateTime<Utc>> {
    doc.get_first(field)
        .and_then(|v| v.as_datetime())
        .and_then(|dt| DateTime::from_timestamp(dt.into_timestamp_secs(), 0))
}

/// Reshape one raw terms-aggregation result into uniform buckets
fn buckets(raw: &serde_json::Value, name: &str) -> Vec<AggregationBucket> {
    raw.get(name)
        .and_then(|agg| agg.get("buckets"))
        .and_then(|buckets| buckets.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|bucket| {
                    let key = match bucket.get("key")? {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    let doc_count = bucket.get("doc_count")?.as_u64()?;
                    Some(AggregationBucket { key, doc_count })
                })
                .collect()
        })
        .unwrap_or_default()
}
