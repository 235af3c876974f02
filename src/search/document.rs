//! Search document mapping for jobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tantivy::TantivyDocument;

use crate::models::Job;
use crate::search::schema::JobFields;

/// Denormalized, search-optimized projection of a job record.
///
/// One document exists per non-deleted job, keyed by the job's id. The
/// document is derived state: created, replaced and removed in response
/// to job lifecycle events and never read back as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    pub id: String,
    pub title: String,
    pub description: String,
    pub employment_type: String,
    pub experience_level: String,
    pub location_type: String,
    pub location: String,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub salary_currency: String,
    pub skills: Vec<String>,
    pub company_id: String,
    /// Resolved via the company directory; absent when the lookup had no
    /// match
    pub company_name: Option<String>,
    pub recruiter_id: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub apply_url: Option<String>,
    /// Derived facet label, e.g. "50k-80k"
    pub salary_range: String,
    /// Combined searchable text for broad-match fallback
    pub full_text: String,
}

impl JobDocument {
    /// Map a job record (plus its resolved company name) into its search
    /// document. Pure and deterministic: the same input always yields the
    /// same document, so reindexing is reproducible.
    pub fn from_job(job: &Job, company_name: Option<&str>) -> Self {
        let skills: Vec<String> = job
            .skills
            .iter()
            .map(|skill| skill.trim().to_string())
            .filter(|skill| !skill.is_empty())
            .collect();

        let full_text = full_text(job, company_name, &skills);

        Self {
            id: job.id.to_string(),
            title: job.title.clone(),
            description: job.description.clone(),
            employment_type: job.employment_type.to_string(),
            experience_level: job.experience_level.to_string(),
            location_type: job.location_type.to_string(),
            location: job.location.clone(),
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            salary_currency: job.salary_currency.clone(),
            skills,
            company_id: job.company_id.to_string(),
            company_name: company_name.map(str::to_string),
            recruiter_id: job.recruiter_id.to_string(),
            is_active: job.is_active,
            is_deleted: job.is_deleted,
            created_at: job.created_at,
            updated_at: job.updated_at,
            apply_url: job.apply_url.clone(),
            salary_range: salary_range(job.salary_min, job.salary_max),
            full_text,
        }
    }

    /// The index-document id: always the job's identifier
    pub fn document_id(&self) -> &str {
        &self.id
    }

    /// Write the document into Tantivy's representation
    pub fn to_tantivy_doc(&self, fields: &JobFields) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        doc.add_text(fields.id, &self.id);
        doc.add_text(fields.title, &self.title);
        doc.add_text(fields.title_keyword, &self.title);
        doc.add_text(fields.description, &self.description);
        doc.add_text(fields.employment_type, &self.employment_type);
        doc.add_text(fields.experience_level, &self.experience_level);
        doc.add_text(fields.location_type, &self.location_type);
        doc.add_text(fields.location, &self.location);
        doc.add_text(fields.location_keyword, &self.location);

        if let Some(min) = self.salary_min {
            doc.add_u64(fields.salary_min, u64::from(min));
        }
        if let Some(max) = self.salary_max {
            doc.add_u64(fields.salary_max, u64::from(max));
        }
        doc.add_text(fields.salary_currency, &self.salary_currency);

        for skill in &self.skills {
            doc.add_text(fields.skills, skill);
        }

        doc.add_text(fields.company_id, &self.company_id);
        if let Some(ref name) = self.company_name {
            doc.add_text(fields.company_name, name);
            doc.add_text(fields.company_name_keyword, name);
        }
        doc.add_text(fields.recruiter_id, &self.recruiter_id);

        doc.add_bool(fields.is_active, self.is_active);
        doc.add_bool(fields.is_deleted, self.is_deleted);

        doc.add_date(
            fields.created_at,
            tantivy::DateTime::from_timestamp_secs(self.created_at.timestamp()),
        );
        doc.add_date(
            fields.updated_at,
            tantivy::DateTime::from_timestamp_secs(self.updated_at.timestamp()),
        );

        if let Some(ref url) = self.apply_url {
            doc.add_text(fields.apply_url, url);
        }

        doc.add_text(fields.salary_range, &self.salary_range);
        doc.add_text(fields.full_text, &self.full_text);

        doc
    }
}

/// Human-readable salary facet label. Bounds round to the nearest
/// thousand; the exact format is load-bearing for facet continuity
/// across reindexes.
fn salary_range(salary_min: Option<u32>, salary_max: Option<u32>) -> String {
    match (salary_min, salary_max) {
        (Some(min), Some(max)) => format!("{}k-{}k", round_k(min), round_k(max)),
        (Some(min), None) => format!("{}k+", round_k(min)),
        _ => "Not specified".to_string(),
    }
}

fn round_k(value: u32) -> u32 {
    (value + 500) / 1000
}

/// Space-joined title, description, company name, location and skills,
/// in that order, with empty values dropped
fn full_text(job: &Job, company_name: Option<&str>, skills: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(4 + skills.len());

    parts.push(job.title.as_str());
    parts.push(job.description.as_str());
    if let Some(name) = company_name {
        parts.push(name);
    }
    parts.push(job.location.as_str());
    for skill in skills {
        parts.push(skill.as_str());
    }

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
