//! Search request types and query translation

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::ops::Bound;
use strum::{Display, EnumString};
use tantivy::aggregation::agg_req::Aggregations;
use tantivy::query::{
    BooleanQuery, BoostQuery, ConstScoreQuery, DisjunctionMaxQuery, FuzzyTermQuery, Occur, Query,
    RangeQuery, RegexQuery, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::{Index, Term};
use uuid::Uuid;

use crate::models::{EmploymentType, ExperienceLevel, LocationType};
use crate::search::error::{SearchError, SearchResult};
use crate::search::schema::JobFields;

/// Sort modes for search results
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobSortBy {
    /// Relevance ranking; falls back to newest-first when there is no
    /// query text to rank against
    #[default]
    Relevance,
    DateDesc,
    DateAsc,
    /// Highest pay first, by upper then lower bound; unspecified salaries
    /// sort last
    SalaryDesc,
    /// Lowest pay first, by lower then upper bound; unspecified salaries
    /// sort last
    SalaryAsc,
}

/// Fields eligible for autocomplete suggestions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestField {
    #[default]
    Title,
    Location,
    Skills,
    CompanyName,
}

fn default_page() -> usize {
    1
}

fn default_size() -> usize {
    20
}

/// A structured job search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSearchRequest {
    /// Free-text query
    #[serde(default)]
    pub query: String,

    /// Location text filter
    #[serde(default)]
    pub location: String,

    /// Keep only these employment types (empty = no filter)
    #[serde(default)]
    pub employment_type: Vec<EmploymentType>,

    /// Keep only these experience levels (empty = no filter)
    #[serde(default)]
    pub experience_level: Vec<ExperienceLevel>,

    /// Keep only these location types (empty = no filter)
    #[serde(default)]
    pub location_type: Vec<LocationType>,

    /// Keep jobs matching at least one of these skills
    #[serde(default)]
    pub skills: Vec<String>,

    /// Salary window lower bound
    #[serde(default)]
    pub salary_min: Option<u32>,

    /// Salary window upper bound
    #[serde(default)]
    pub salary_max: Option<u32>,

    /// Keep only this company's postings
    #[serde(default)]
    pub company_id: Option<Uuid>,

    #[serde(default)]
    pub sort_by: JobSortBy,

    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: usize,

    /// Page size
    #[serde(default = "default_size")]
    pub size: usize,
}

impl Default for JobSearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            location: String::new(),
            employment_type: Vec::new(),
            experience_level: Vec::new(),
            location_type: Vec::new(),
            skills: Vec::new(),
            salary_min: None,
            salary_max: None,
            company_id: None,
            sort_by: JobSortBy::default(),
            page: default_page(),
            size: default_size(),
        }
    }
}

impl JobSearchRequest {
    /// Create a request with free-text query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_employment_types(mut self, types: Vec<EmploymentType>) -> Self {
        self.employment_type = types;
        self
    }

    pub fn with_experience_levels(mut self, levels: Vec<ExperienceLevel>) -> Self {
        self.experience_level = levels;
        self
    }

    pub fn with_location_types(mut self, types: Vec<LocationType>) -> Self {
        self.location_type = types;
        self
    }

    pub fn with_skills(mut self, skills: Vec<impl Into<String>>) -> Self {
        self.skills = skills.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn with_salary_bounds(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.salary_min = min;
        self.salary_max = max;
        self
    }

    pub fn with_company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_sort(mut self, sort_by: JobSortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Whether the request carries text to rank against
    pub fn has_text_query(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Edit-distance tolerance scaled to term length: exact below three
/// characters, one edit through five, two beyond
pub(crate) fn auto_fuzzy_distance(token: &str) -> u8 {
    match token.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn fuzzy_term(field: Field, token: &str) -> Box<dyn Query> {
    let term = Term::from_field_text(field, token);
    Box::new(FuzzyTermQuery::new(term, auto_fuzzy_distance(token), true))
}

/// Wrap a clause so it filters without contributing to relevance
fn filter(query: Box<dyn Query>) -> Box<dyn Query> {
    Box::new(ConstScoreQuery::new(query, 0.0))
}

/// Translates job search requests into the index engine's boolean query
/// trees, sort keys and aggregation requests
pub struct QueryBuilder {
    index: Index,
    fields: JobFields,
}

impl QueryBuilder {
    pub fn new(index: Index, fields: JobFields) -> Self {
        Self { index, fields }
    }

    /// Build the boolean query for a search request
    pub fn build(&self, request: &JobSearchRequest) -> SearchResult<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        // Base filter: only live, listed postings are ever searchable
        clauses.push((
            Occur::Must,
            filter(Box::new(TermQuery::new(
                Term::from_field_bool(self.fields.is_active, true),
                IndexRecordOption::Basic,
            ))),
        ));
        clauses.push((
            Occur::Must,
            filter(Box::new(TermQuery::new(
                Term::from_field_bool(self.fields.is_deleted, false),
                IndexRecordOption::Basic,
            ))),
        ));

        // Weighted multi-field text match; without query text the base
        // filter alone matches everything
        if request.has_text_query() {
            if let Some(text_query) = self.full_text_query(&request.query)? {
                clauses.push((Occur::Must, text_query));
            }
        }

        if let Some(location_filter) = self.location_filter(&request.location)? {
            clauses.push((Occur::Must, location_filter));
        }

        for (field, values) in [
            (self.fields.employment_type, as_terms(&request.employment_type)),
            (self.fields.experience_level, as_terms(&request.experience_level)),
            (self.fields.location_type, as_terms(&request.location_type)),
        ] {
            if let Some(terms_filter) = terms_filter(field, &values) {
                clauses.push((Occur::Must, terms_filter));
            }
        }

        if let Some(skills_filter) = self.skills_filter(&request.skills) {
            clauses.push((Occur::Must, skills_filter));
        }

        if let Some(salary_filter) = salary_filter(request.salary_min, request.salary_max) {
            clauses.push((Occur::Must, salary_filter));
        }

        if let Some(company_id) = request.company_id {
            clauses.push((
                Occur::Must,
                filter(Box::new(TermQuery::new(
                    Term::from_field_text(self.fields.company_id, &company_id.to_string()),
                    IndexRecordOption::Basic,
                ))),
            ));
        }

        Ok(Box::new(BooleanQuery::from(clauses)))
    }

    /// The fixed aggregation request, computed over the filtered result
    /// set on every search
    pub fn aggregations(&self) -> SearchResult<Aggregations> {
        serde_json::from_value(json!({
            "locations": { "terms": { "field": "location_keyword", "size": 20 } },
            "employment_types": { "terms": { "field": "employment_type", "size": 10 } },
            "experience_levels": { "terms": { "field": "experience_level", "size": 10 } },
            "location_types": { "terms": { "field": "location_type", "size": 10 } },
            "skills": { "terms": { "field": "skills", "size": 30 } },
            "salary_ranges": { "terms": { "field": "salary_range", "size": 10 } },
        }))
        .map_err(|e| SearchError::QueryBuildFailed(format!("aggregation request: {e}")))
    }

    /// Suggestion query: whole-value prefix match first, then substring,
    /// then fuzzy, always restricted to live postings
    pub fn suggest_query(&self, text: &str, field: SuggestField) -> SearchResult<Box<dyn Query>> {
        let (keyword_field, analyzed_field) = match field {
            SuggestField::Title => (self.fields.title_keyword, self.fields.title),
            SuggestField::Location => (self.fields.location_keyword, self.fields.location),
            SuggestField::Skills => (self.fields.skills, self.fields.skills),
            SuggestField::CompanyName => {
                (self.fields.company_name_keyword, self.fields.company_name)
            }
        };

        let needle = regex::escape(&text.trim().to_lowercase());

        let prefix = RegexQuery::from_pattern(&format!("{needle}.*"), keyword_field)
            .map_err(|e| SearchError::QueryBuildFailed(format!("prefix pattern: {e}")))?;
        let substring = RegexQuery::from_pattern(&format!(".*{needle}.*"), keyword_field)
            .map_err(|e| SearchError::QueryBuildFailed(format!("substring pattern: {e}")))?;

        let mut candidates: Vec<Box<dyn Query>> = vec![
            Box::new(BoostQuery::new(Box::new(prefix), 3.0)),
            Box::new(BoostQuery::new(Box::new(substring), 2.0)),
        ];

        let fuzzy: Vec<Box<dyn Query>> = self
            .analyze(analyzed_field, text)?
            .iter()
            .map(|token| fuzzy_term(analyzed_field, token))
            .collect();
        if !fuzzy.is_empty() {
            candidates.push(Box::new(BoostQuery::new(
                Box::new(BooleanQuery::union(fuzzy)),
                1.0,
            )));
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = vec![
            (
                Occur::Must,
                filter(Box::new(TermQuery::new(
                    Term::from_field_bool(self.fields.is_active, true),
                    IndexRecordOption::Basic,
                ))),
            ),
            (
                Occur::Must,
                filter(Box::new(TermQuery::new(
                    Term::from_field_bool(self.fields.is_deleted, false),
                    IndexRecordOption::Basic,
                ))),
            ),
            // nested union: at least one candidate clause has to match
            (Occur::Must, Box::new(BooleanQuery::union(candidates))),
        ];

        Ok(Box::new(BooleanQuery::from(clauses)))
    }

    /// Weighted per-field fuzzy match combined best-fields style
    fn full_text_query(&self, text: &str) -> SearchResult<Option<Box<dyn Query>>> {
        let weighted_fields = [
            (self.fields.title, 3.0),
            (self.fields.description, 2.0),
            (self.fields.skills, 2.0),
            (self.fields.company_name, 2.0),
            (self.fields.location, 1.0),
            (self.fields.full_text, 1.0),
        ];

        let mut per_field: Vec<Box<dyn Query>> = Vec::new();
        for (field, weight) in weighted_fields {
            let tokens = self.analyze(field, text)?;
            if tokens.is_empty() {
                continue;
            }

            let term_queries: Vec<Box<dyn Query>> = tokens
                .iter()
                .map(|token| fuzzy_term(field, token))
                .collect();

            let field_query: Box<dyn Query> = if term_queries.len() == 1 {
                term_queries.into_iter().next().ok_or_else(|| {
                    SearchError::QueryBuildFailed("empty term list".to_string())
                })?
            } else {
                Box::new(BooleanQuery::union(term_queries))
            };

            per_field.push(Box::new(BoostQuery::new(field_query, weight)));
        }

        if per_field.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(DisjunctionMaxQuery::new(per_field))))
    }

    /// Location is a filter on top of any text query, not a replacement
    /// for it
    fn location_filter(&self, location: &str) -> SearchResult<Option<Box<dyn Query>>> {
        if location.trim().is_empty() {
            return Ok(None);
        }

        let mut should: Vec<Box<dyn Query>> = self
            .analyze(self.fields.location, location)?
            .iter()
            .map(|token| fuzzy_term(self.fields.location, token))
            .collect();

        let whole = location.trim().to_lowercase();
        should.push(fuzzy_term(self.fields.location_keyword, &whole));

        Ok(Some(filter(Box::new(BooleanQuery::union(should)))))
    }

    /// A job needs to match at least one requested skill, not all of them
    fn skills_filter(&self, skills: &[String]) -> Option<Box<dyn Query>> {
        let should: Vec<Box<dyn Query>> = skills
            .iter()
            .map(|skill| skill.trim().to_lowercase())
            .filter(|skill| !skill.is_empty())
            .map(|skill| fuzzy_term(self.fields.skills, &skill))
            .collect();

        if should.is_empty() {
            return None;
        }
        Some(filter(Box::new(BooleanQuery::union(should))))
    }

    /// Run text through the analyzer registered for a field
    fn analyze(&self, field: Field, text: &str) -> SearchResult<Vec<String>> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(field)
            .map_err(|e| SearchError::QueryBuildFailed(format!("no analyzer for field: {e}")))?;

        let mut tokens = Vec::new();
        let mut stream = analyzer.token_stream(text);
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        Ok(tokens)
    }
}

fn as_terms<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Exact-match "is one of" filter over a keyword field
fn terms_filter(field: Field, values: &[String]) -> Option<Box<dyn Query>> {
    if values.is_empty() {
        return None;
    }

    let terms: Vec<Box<dyn Query>> = values
        .iter()
        .map(|value| {
            Box::new(TermQuery::new(
                Term::from_field_text(field, value),
                IndexRecordOption::Basic,
            )) as Box<dyn Query>
        })
        .collect();

    Some(filter(Box::new(BooleanQuery::union(terms))))
}

/// Overlap semantics: a job qualifies when either of its bounds falls in
/// the requested window, not only when the window contains it entirely
fn salary_filter(salary_min: Option<u32>, salary_max: Option<u32>) -> Option<Box<dyn Query>> {
    if salary_min.is_none() && salary_max.is_none() {
        return None;
    }

    let lower = salary_min
        .map(|v| Bound::Included(u64::from(v)))
        .unwrap_or(Bound::Unbounded);
    let upper = salary_max
        .map(|v| Bound::Included(u64::from(v)))
        .unwrap_or(Bound::Unbounded);

    let min_in_window = RangeQuery::new_u64_bounds("salary_min".to_string(), lower, upper);
    let max_in_window = RangeQuery::new_u64_bounds("salary_max".to_string(), lower, upper);

    Some(filter(Box::new(BooleanQuery::union(vec![
        Box::new(min_in_window),
        Box::new(max_in_window),
    ]))))
}
