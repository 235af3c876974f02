use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

/// Contract basis of a job posting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

/// Seniority expected for a job posting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

/// Where the work happens
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationType {
    Onsite,
    Remote,
    Hybrid,
}

/// A job posting as held by the primary job store.
///
/// The search subsystem never owns these records; it only derives search
/// documents from them. `recruiter_id` and `created_at` are immutable once
/// the record exists; everything else can change over the posting's life.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Job {
    /// Unique identifier
    pub id: Uuid,

    /// Recruiter profile that owns the posting
    pub recruiter_id: Uuid,

    /// Company the posting belongs to
    pub company_id: Uuid,

    /// Posting title
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Full description
    #[validate(length(min = 1))]
    pub description: String,

    pub employment_type: EmploymentType,

    pub experience_level: ExperienceLevel,

    pub location_type: LocationType,

    /// City / region, or a remote tag
    #[validate(length(min = 1, max = 255))]
    pub location: String,

    /// Lower salary bound, in `salary_currency` units
    pub salary_min: Option<u32>,

    /// Upper salary bound, in `salary_currency` units
    pub salary_max: Option<u32>,

    /// ISO currency code
    #[serde(default = "default_currency")]
    pub salary_currency: String,

    /// Skill tags, in the order the recruiter listed them
    #[serde(default)]
    pub skills: Vec<String>,

    /// External application link
    pub apply_url: Option<String>,

    /// Whether the posting is currently listed
    pub is_active: bool,

    /// Soft-delete flag
    pub is_deleted: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Job {
    /// Create a new active posting
    pub fn new(
        recruiter_id: Uuid,
        company_id: Uuid,
        title: String,
        description: String,
        employment_type: EmploymentType,
        experience_level: ExperienceLevel,
        location_type: LocationType,
        location: String,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            recruiter_id,
            company_id,
            title,
            description,
            employment_type,
            experience_level,
            location_type,
            location,
            salary_min: None,
            salary_max: None,
            salary_currency: default_currency(),
            skills: Vec::new(),
            apply_url: None,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field rules plus the cross-field salary invariant
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;

        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salary_min cannot be greater than salary_max".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Mark the posting as soft-deleted
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.updated_at = Utc::now();
    }

    /// Whether the posting belongs in search results
    pub fn is_searchable(&self) -> bool {
        self.is_active && !self.is_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Backend Engineer".to_string(),
            "Build and run the jobs API".to_string(),
            EmploymentType::FullTime,
            ExperienceLevel::Senior,
            LocationType::Remote,
            "Berlin".to_string(),
        )
    }

    #[test]
    fn test_new_job_is_searchable() {
        let job = sample_job();
        assert!(job.is_active);
        assert!(!job.is_deleted);
        assert!(job.is_searchable());
    }

    #[test]
    fn test_soft_delete_removes_from_search() {
        let mut job = sample_job();
        job.soft_delete();
        assert!(job.is_deleted);
        assert!(!job.is_searchable());
    }

    #[test]
    fn test_salary_bounds_invariant() {
        let mut job = sample_job();
        job.salary_min = Some(90_000);
        job.salary_max = Some(60_000);
        assert!(job.validate().is_err());

        job.salary_max = Some(120_000);
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(EmploymentType::FullTime.to_string(), "full_time");
        assert_eq!(
            "part_time".parse::<EmploymentType>().unwrap(),
            EmploymentType::PartTime
        );
        assert_eq!(LocationType::Onsite.to_string(), "onsite");
        assert_eq!("lead".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Lead);
    }
}
