//! End-to-end tests for the job search surface

use chrono::{Duration, Utc};
use jobboard_search::models::{Company, EmploymentType, ExperienceLevel, Job, LocationType};
use jobboard_search::search::{
    IndexManager, JobSearchRequest, JobSearchService, JobSortBy, SearchConfig, SuggestField,
};
use jobboard_search::store::{InMemoryCompanyDirectory, InMemoryJobStore};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

struct TestHarness {
    service: JobSearchService,
    companies: Arc<InMemoryCompanyDirectory>,
    _temp_dir: TempDir,
}

async fn create_harness() -> TestHarness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("jobboard_search=debug")
        .with_test_writer()
        .try_init();

    let temp_dir = TempDir::new().unwrap();
    let config = SearchConfig {
        index_path: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let index = Arc::new(IndexManager::new(config).await.unwrap());
    let companies = Arc::new(InMemoryCompanyDirectory::new());

    let service = JobSearchService::new(
        index,
        Arc::new(InMemoryJobStore::new()),
        companies.clone(),
    );

    TestHarness {
        service,
        companies,
        _temp_dir: temp_dir,
    }
}

fn create_test_job(title: &str, description: &str, location: &str, skills: &[&str]) -> Job {
    let mut job = Job::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        title.to_string(),
        description.to_string(),
        EmploymentType::FullTime,
        ExperienceLevel::Mid,
        LocationType::Onsite,
        location.to_string(),
    );
    job.skills = skills.iter().map(|s| s.to_string()).collect();
    job
}

async fn index_jobs(harness: &TestHarness, jobs: &[Job]) {
    for job in jobs {
        harness.service.index_job(job).await;
    }
}

#[tokio::test]
async fn test_base_filter_excludes_inactive_and_deleted() {
    let harness = create_harness().await;

    let live_a = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);
    let live_b = create_test_job("Frontend Engineer", "UI", "Berlin", &[]);
    let mut paused = create_test_job("Paused Engineer", "On hold", "Berlin", &[]);
    paused.is_active = false;
    let mut removed = create_test_job("Removed Engineer", "Gone", "Berlin", &[]);
    removed.soft_delete();

    index_jobs(&harness, &[live_a, live_b, paused, removed]).await;

    let results = harness
        .service
        .search_jobs(&JobSearchRequest::default())
        .await
        .unwrap();

    assert_eq!(results.total, 2);
    for job in &results.jobs {
        assert!(job.is_active);
    }
}

#[tokio::test]
async fn test_text_search_ranks_title_matches_first() {
    let harness = create_harness().await;

    let title_hit = create_test_job("Database Engineer", "Run our platform", "Berlin", &[]);
    let description_hit = create_test_job(
        "Platform Engineer",
        "Operate the database fleet",
        "Berlin",
        &[],
    );
    let miss = create_test_job("Designer", "Brand work", "Berlin", &[]);

    index_jobs(&harness, &[title_hit.clone(), description_hit.clone(), miss]).await;

    let results = harness
        .service
        .search_jobs(&JobSearchRequest::new("database"))
        .await
        .unwrap();

    assert_eq!(results.total, 2);
    assert_eq!(results.jobs[0].id, title_hit.id.to_string());
    assert!(results.jobs.iter().all(|job| job.score.is_some()));
}

#[tokio::test]
async fn test_text_search_tolerates_typos() {
    let harness = create_harness().await;

    let job = create_test_job("Backend Engineer", "APIs all day", "Berlin", &[]);
    index_jobs(&harness, &[job]).await;

    let results = harness
        .service
        .search_jobs(&JobSearchRequest::new("enginer"))
        .await
        .unwrap();

    assert_eq!(results.total, 1);
}

#[tokio::test]
async fn test_skills_filter_is_a_disjunction() {
    let harness = create_harness().await;

    let react_only = create_test_job("Frontend Engineer", "UI", "Berlin", &["React"]);
    let unrelated = create_test_job("Data Engineer", "Pipelines", "Berlin", &["Spark"]);

    index_jobs(&harness, &[react_only.clone(), unrelated]).await;

    let request = JobSearchRequest::default().with_skills(vec!["React", "Vue", "Angular"]);
    let results = harness.service.search_jobs(&request).await.unwrap();

    // matching one of three requested skills is enough
    assert_eq!(results.total, 1);
    assert_eq!(results.jobs[0].id, react_only.id.to_string());
}

#[tokio::test]
async fn test_salary_filter_uses_overlap_semantics() {
    let harness = create_harness().await;

    let mut job = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);
    job.salary_min = Some(40_000);
    job.salary_max = Some(60_000);
    index_jobs(&harness, &[job]).await;

    // 40k-60k overlaps a window starting at 50k
    let overlapping = JobSearchRequest::default().with_salary_bounds(Some(50_000), None);
    let results = harness.service.search_jobs(&overlapping).await.unwrap();
    assert_eq!(results.total, 1);

    // but not one starting at 70k
    let disjoint = JobSearchRequest::default().with_salary_bounds(Some(70_000), None);
    let results = harness.service.search_jobs(&disjoint).await.unwrap();
    assert_eq!(results.total, 0);
}

#[tokio::test]
async fn test_categorical_filters() {
    let harness = create_harness().await;

    let mut contract = create_test_job("Contract Engineer", "Short term", "Berlin", &[]);
    contract.employment_type = EmploymentType::Contract;
    contract.experience_level = ExperienceLevel::Senior;
    let full_time = create_test_job("Staff Engineer", "Long term", "Berlin", &[]);

    index_jobs(&harness, &[contract.clone(), full_time]).await;

    let request =
        JobSearchRequest::default().with_employment_types(vec![EmploymentType::Contract]);
    let results = harness.service.search_jobs(&request).await.unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.jobs[0].id, contract.id.to_string());

    let request = JobSearchRequest::default().with_experience_levels(vec![
        ExperienceLevel::Senior,
        ExperienceLevel::Lead,
    ]);
    let results = harness.service.search_jobs(&request).await.unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.jobs[0].id, contract.id.to_string());
}

#[tokio::test]
async fn test_location_filter_is_additive_to_text_query() {
    let harness = create_harness().await;

    let berlin = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);
    let lisbon = create_test_job("Backend Engineer", "APIs", "Lisbon", &[]);

    index_jobs(&harness, &[berlin.clone(), lisbon]).await;

    let request = JobSearchRequest::new("engineer").with_location("berlin");
    let results = harness.service.search_jobs(&request).await.unwrap();

    assert_eq!(results.total, 1);
    assert_eq!(results.jobs[0].id, berlin.id.to_string());
}

#[tokio::test]
async fn test_company_filter() {
    let harness = create_harness().await;

    let acme = Company::new(Uuid::new_v4(), "Acme");
    harness.companies.save_company(acme.clone());

    let mut at_acme = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);
    at_acme.company_id = acme.id;
    let elsewhere = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);

    index_jobs(&harness, &[at_acme.clone(), elsewhere]).await;

    let request = JobSearchRequest::default().with_company(acme.id);
    let results = harness.service.search_jobs(&request).await.unwrap();

    assert_eq!(results.total, 1);
    assert_eq!(results.jobs[0].id, at_acme.id.to_string());
}

#[tokio::test]
async fn test_pagination_metadata() {
    let harness = create_harness().await;

    let jobs: Vec<Job> = (0..5)
        .map(|i| create_test_job(&format!("Engineer {i}"), "APIs", "Berlin", &[]))
        .collect();
    index_jobs(&harness, &jobs).await;

    let request = JobSearchRequest::default().with_size(2);
    let results = harness.service.search_jobs(&request).await.unwrap();
    assert_eq!(results.total, 5);
    assert_eq!(results.total_pages, 3);
    assert_eq!(results.jobs.len(), 2);

    let last_page = JobSearchRequest::default().with_size(2).with_page(3);
    let results = harness.service.search_jobs(&last_page).await.unwrap();
    assert_eq!(results.jobs.len(), 1);

    // beyond the last page: empty but not an error, with the true total
    let beyond = JobSearchRequest::default().with_size(2).with_page(99);
    let results = harness.service.search_jobs(&beyond).await.unwrap();
    assert!(results.jobs.is_empty());
    assert_eq!(results.total, 5);
    assert_eq!(results.total_pages, 3);
}

#[tokio::test]
async fn test_sort_by_date() {
    let harness = create_harness().await;

    let now = Utc::now();
    let jobs: Vec<Job> = (0..4)
        .map(|i| {
            let mut job = create_test_job(&format!("Engineer {i}"), "APIs", "Berlin", &[]);
            job.created_at = now - Duration::days(i);
            job.updated_at = job.created_at;
            job
        })
        .collect();
    index_jobs(&harness, &jobs).await;

    let request = JobSearchRequest::default().with_sort(JobSortBy::DateDesc);
    let results = harness.service.search_jobs(&request).await.unwrap();
    let stamps: Vec<_> = results.jobs.iter().map(|job| job.created_at).collect();
    assert!(stamps.windows(2).all(|pair| pair[0] >= pair[1]));

    let request = JobSearchRequest::default().with_sort(JobSortBy::DateAsc);
    let results = harness.service.search_jobs(&request).await.unwrap();
    let stamps: Vec<_> = results.jobs.iter().map(|job| job.created_at).collect();
    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_relevance_without_query_falls_back_to_newest_first() {
    let harness = create_harness().await;

    let now = Utc::now();
    let mut older = create_test_job("Older", "APIs", "Berlin", &[]);
    older.created_at = now - Duration::days(7);
    let mut newer = create_test_job("Newer", "APIs", "Berlin", &[]);
    newer.created_at = now;

    index_jobs(&harness, &[older, newer.clone()]).await;

    let results = harness
        .service
        .search_jobs(&JobSearchRequest::default())
        .await
        .unwrap();

    assert_eq!(results.jobs[0].id, newer.id.to_string());
    // field-sorted hits carry no relevance score
    assert!(results.jobs.iter().all(|job| job.score.is_none()));
}

#[tokio::test]
async fn test_sort_by_salary_puts_unspecified_last() {
    let harness = create_harness().await;

    let mut high = create_test_job("High", "APIs", "Berlin", &[]);
    high.salary_min = Some(100_000);
    high.salary_max = Some(120_000);
    let mut low = create_test_job("Low", "APIs", "Berlin", &[]);
    low.salary_min = Some(50_000);
    low.salary_max = Some(60_000);
    let unspecified = create_test_job("Unspecified", "APIs", "Berlin", &[]);

    index_jobs(&harness, &[high.clone(), low.clone(), unspecified.clone()]).await;

    let request = JobSearchRequest::default().with_sort(JobSortBy::SalaryDesc);
    let results = harness.service.search_jobs(&request).await.unwrap();
    let ids: Vec<_> = results.jobs.iter().map(|job| job.id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            high.id.to_string(),
            low.id.to_string(),
            unspecified.id.to_string()
        ]
    );

    let request = JobSearchRequest::default().with_sort(JobSortBy::SalaryAsc);
    let results = harness.service.search_jobs(&request).await.unwrap();
    let ids: Vec<_> = results.jobs.iter().map(|job| job.id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            low.id.to_string(),
            high.id.to_string(),
            unspecified.id.to_string()
        ]
    );
}

#[tokio::test]
async fn test_aggregations_count_the_filtered_set() {
    let harness = create_harness().await;

    let mut contract = create_test_job("A", "APIs", "Berlin", &["React"]);
    contract.employment_type = EmploymentType::Contract;
    let full_a = create_test_job("B", "APIs", "Berlin", &["React", "GraphQL"]);
    let full_b = create_test_job("C", "APIs", "Lisbon", &[]);

    index_jobs(&harness, &[contract, full_a, full_b]).await;

    let results = harness
        .service
        .search_jobs(&JobSearchRequest::default())
        .await
        .unwrap();
    let aggs = &results.aggregations;

    let employment: Vec<_> = aggs
        .employment_types
        .iter()
        .map(|bucket| (bucket.key.as_str(), bucket.doc_count))
        .collect();
    assert_eq!(employment, vec![("full_time", 2), ("contract", 1)]);

    // facet keys keep their original casing
    let react = aggs
        .skills
        .iter()
        .find(|bucket| bucket.key == "React")
        .expect("React bucket");
    assert_eq!(react.doc_count, 2);

    let berlin = aggs
        .locations
        .iter()
        .find(|bucket| bucket.key == "Berlin")
        .expect("Berlin bucket");
    assert_eq!(berlin.doc_count, 2);

    assert!(aggs
        .salary_ranges
        .iter()
        .any(|bucket| bucket.key == "Not specified"));
}

#[tokio::test]
async fn test_suggestions_expand_and_dedupe_skills() {
    let harness = create_harness().await;

    let job_a = create_test_job("Frontend", "UI", "Berlin", &["React", "Redux"]);
    let job_b = create_test_job("Fullstack", "UI+API", "Berlin", &["React", "Rust"]);

    index_jobs(&harness, &[job_a, job_b]).await;

    let suggestions = harness.service.suggest("re", SuggestField::Skills).await;
    let texts: Vec<_> = suggestions.iter().map(|s| s.text.as_str()).collect();

    assert!(texts.contains(&"React"));
    assert!(texts.contains(&"Redux"));
    // case-insensitive substring containment gates array values
    assert!(!texts.contains(&"Rust"));
    // deduplicated across documents
    assert_eq!(texts.iter().filter(|t| **t == "React").count(), 1);
    assert!(suggestions.len() <= 10);
}

#[tokio::test]
async fn test_suggestions_match_title_prefixes() {
    let harness = create_harness().await;

    let job_a = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);
    let job_b = create_test_job("Backend Developer", "APIs", "Berlin", &[]);
    let job_c = create_test_job("Designer", "Brand", "Berlin", &[]);

    index_jobs(&harness, &[job_a, job_b, job_c]).await;

    let suggestions = harness.service.suggest("back", SuggestField::Title).await;
    let texts: Vec<_> = suggestions.iter().map(|s| s.text.as_str()).collect();

    assert!(texts.contains(&"Backend Engineer"));
    assert!(texts.contains(&"Backend Developer"));
    assert!(!texts.contains(&"Designer"));
}

#[tokio::test]
async fn test_suggestions_skip_unlisted_jobs() {
    let harness = create_harness().await;

    let mut paused = create_test_job("Frontend", "UI", "Berlin", &["React"]);
    paused.is_active = false;

    index_jobs(&harness, &[paused]).await;

    let suggestions = harness.service.suggest("re", SuggestField::Skills).await;
    assert!(suggestions.is_empty());
}

#[tokio::test]
async fn test_company_name_is_searchable_after_indexing() {
    let harness = create_harness().await;

    let acme = Company::new(Uuid::new_v4(), "Acme Robotics");
    harness.companies.save_company(acme.clone());

    let mut job = create_test_job("Backend Engineer", "APIs", "Berlin", &[]);
    job.company_id = acme.id;
    index_jobs(&harness, &[job]).await;

    let results = harness
        .service
        .search_jobs(&JobSearchRequest::new("robotics"))
        .await
        .unwrap();

    assert_eq!(results.total, 1);
    assert_eq!(results.jobs[0].company_name.as_deref(), Some("Acme Robotics"));
}
