//! Jobs index structure: analyzers and field mappings
//!
//! Two custom analyzers cover the two kinds of text the index holds:
//! `job_text` for prose (tokenize, lowercase, drop stopwords, stem) and
//! `tag` for whole-value fields like skills (single token, lowercased).
//! Fields that need both full-text and exact/facet behavior get a
//! `*_keyword` companion holding the whole value.

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, TEXT,
};
use tantivy::tokenizer::{
    Language, LowerCaser, RawTokenizer, RemoveLongFilter, SimpleTokenizer, Stemmer,
    StopWordFilter, TextAnalyzer,
};
use tantivy::Index;

use crate::search::error::{SearchError, SearchResult};

/// Analyzer for prose fields (title, description, full_text)
pub const JOB_TEXT_ANALYZER: &str = "job_text";

/// Analyzer for skill tags and `*_keyword` companions: the whole value is
/// one token, lowercased. Values are trimmed by the document mapper.
pub const TAG_ANALYZER: &str = "tag";

/// Register the custom analyzers on an index. Must run before the first
/// write or query against any `job_text`/`tag` field.
pub fn register_analyzers(index: &Index) {
    let prose = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(
            StopWordFilter::new(Language::English)
                .unwrap_or_else(|| StopWordFilter::remove(Vec::<String>::new())),
        )
        .filter(Stemmer::new(Language::English))
        .build();
    index.tokenizers().register(JOB_TEXT_ANALYZER, prose);

    let tag = TextAnalyzer::builder(RawTokenizer::default())
        .filter(LowerCaser)
        .build();
    index.tokenizers().register(TAG_ANALYZER, tag);
}

/// Build the search schema for jobs
pub fn build_jobs_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Exact-match keyword fields: raw token, stored
    let keyword = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer("raw")
                .set_index_option(IndexRecordOption::Basic),
        )
        .set_stored();

    // Keyword fields that also feed facet aggregations: raw fast column
    // keeps the original casing for bucket keys
    let keyword_facet = keyword.clone().set_fast(Some("raw"));

    // Whole-value companions for fields searched both as text and as a
    // unit (suggestions, exact filters); lowercased so matching is
    // case-insensitive, not stored (the display value lives on the text
    // field)
    let keyword_lower = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(TAG_ANALYZER)
            .set_index_option(IndexRecordOption::Basic),
    );

    // Prose fields analyzed for relevance ranking
    let prose = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(JOB_TEXT_ANALYZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();

    // Multi-valued skill tags: whole-value tokens for matching, raw fast
    // column for facets
    let tag = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TAG_ANALYZER)
                .set_index_option(IndexRecordOption::WithFreqs),
        )
        .set_stored()
        .set_fast(Some("raw"));

    schema_builder.add_text_field("id", keyword.clone());

    schema_builder.add_text_field("title", prose.clone());
    schema_builder.add_text_field("title_keyword", keyword_lower.clone());

    schema_builder.add_text_field("description", prose.clone());

    schema_builder.add_text_field("employment_type", keyword_facet.clone());
    schema_builder.add_text_field("experience_level", keyword_facet.clone());
    schema_builder.add_text_field("location_type", keyword_facet.clone());

    // Free-text location plus its whole-value companion; the companion
    // doubles as the facet source
    schema_builder.add_text_field("location", TEXT | STORED);
    schema_builder.add_text_field("location_keyword", keyword_lower.clone().set_fast(Some("raw")));

    schema_builder.add_u64_field("salary_min", INDEXED | STORED | FAST);
    schema_builder.add_u64_field("salary_max", INDEXED | STORED | FAST);
    schema_builder.add_text_field("salary_currency", keyword.clone());

    schema_builder.add_text_field("skills", tag);

    schema_builder.add_text_field("company_id", keyword.clone());
    schema_builder.add_text_field("company_name", TEXT | STORED);
    schema_builder.add_text_field("company_name_keyword", keyword_lower);

    schema_builder.add_text_field("recruiter_id", keyword.clone());

    schema_builder.add_bool_field("is_active", INDEXED | STORED);
    schema_builder.add_bool_field("is_deleted", INDEXED | STORED);

    schema_builder.add_date_field("created_at", INDEXED | STORED | FAST);
    schema_builder.add_date_field("updated_at", INDEXED | STORED | FAST);

    schema_builder.add_text_field("apply_url", keyword);

    // Derived facet label, e.g. "50k-80k"
    schema_builder.add_text_field("salary_range", keyword_facet);

    // Combined searchable text, fallback match field; never stored
    let full_text = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(JOB_TEXT_ANALYZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );
    schema_builder.add_text_field("full_text", full_text);

    schema_builder.build()
}

/// Resolved field handles for the jobs schema
#[derive(Debug, Clone, Copy)]
pub struct JobFields {
    pub id: Field,
    pub title: Field,
    pub title_keyword: Field,
    pub description: Field,
    pub employment_type: Field,
    pub experience_level: Field,
    pub location_type: Field,
    pub location: Field,
    pub location_keyword: Field,
    pub salary_min: Field,
    pub salary_max: Field,
    pub salary_currency: Field,
    pub skills: Field,
    pub company_id: Field,
    pub company_name: Field,
    pub company_name_keyword: Field,
    pub recruiter_id: Field,
    pub is_active: Field,
    pub is_deleted: Field,
    pub created_at: Field,
    pub updated_at: Field,
    pub apply_url: Field,
    pub salary_range: Field,
    pub full_text: Field,
}

impl JobFields {
    /// Resolve every field handle up front so later paths never deal
    /// with missing-field lookups
    pub fn resolve(schema: &Schema) -> SearchResult<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaError(format!("missing field: {name}")))
        };

        Ok(Self {
            id: field("id")?,
            title: field("title")?,
            title_keyword: field("title_keyword")?,
            description: field("description")?,
            employment_type: field("employment_type")?,
            experience_level: field("experience_level")?,
            location_type: field("location_type")?,
            location: field("location")?,
            location_keyword: field("location_keyword")?,
            salary_min: field("salary_min")?,
            salary_max: field("salary_max")?,
            salary_currency: field("salary_currency")?,
            skills: field("skills")?,
            company_id: field("company_id")?,
            company_name: field("company_name")?,
            company_name_keyword: field("company_name_keyword")?,
            recruiter_id: field("recruiter_id")?,
            is_active: field("is_active")?,
            is_deleted: field("is_deleted")?,
            created_at: field("created_at")?,
            updated_at: field("updated_at")?,
            apply_url: field("apply_url")?,
            salary_range: field("salary_range")?,
            full_text: field("full_text")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_building() {
        let schema = build_jobs_schema();
        assert!(schema.get_field("id").is_ok());
        assert!(schema.get_field("title").is_ok());
        assert!(schema.get_field("skills").is_ok());
        assert!(schema.get_field("salary_range").is_ok());
        assert!(schema.get_field("full_text").is_ok());
    }

    #[test]
    fn test_field_resolution() {
        let schema = build_jobs_schema();
        let fields = JobFields::resolve(&schema);
        assert!(fields.is_ok());
    }

    #[test]
    fn test_tag_analyzer_keeps_whole_value() {
        let index = Index::create_in_ram(build_jobs_schema());
        register_analyzers(&index);

        let mut analyzer = index
            .tokenizers()
            .get(TAG_ANALYZER)
            .expect("tag analyzer registered");
        let mut stream = analyzer.token_stream("Machine Learning");
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        assert_eq!(tokens, vec!["machine learning".to_string()]);
    }

    #[test]
    fn test_prose_analyzer_stems_and_lowercases() {
        let index = Index::create_in_ram(build_jobs_schema());
        register_analyzers(&index);

        let mut analyzer = index
            .tokenizers()
            .get(JOB_TEXT_ANALYZER)
            .expect("job_text analyzer registered");
        // "the" is a stopword, "Building" stems to "build"
        let mut stream = analyzer.token_stream("Building the");
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        assert_eq!(tokens, vec!["build".to_string()]);
    }
}
