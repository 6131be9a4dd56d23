use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::services::categorizer::Category;

/// Where a job post was ingested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    X,
    Linkedin,
}

impl JobSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::X => "x",
            JobSource::Linkedin => "linkedin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "x" | "twitter" => Some(JobSource::X),
            "linkedin" => Some(JobSource::Linkedin),
            _ => None,
        }
    }
}

/// Normalized hiring post (stored in MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Upsert key: "{source}:{post_id}"
    pub job_id: String,

    pub title: String,
    pub employer: String,
    #[serde(default)]
    pub employer_handle: Option<String>,
    pub location: String,
    pub category: Category,
    pub source: JobSource,

    /// Original post text
    pub raw_text: String,
    pub link: String,

    /// Unix timestamp reported by the source (if any)
    #[serde(default)]
    pub posted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,

    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub clicks: i64,
}

/// Job produced by the ingestion normalizer, before it hits the database
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub job_id: String,
    pub title: String,
    pub employer: String,
    pub employer_handle: Option<String>,
    pub location: String,
    pub category: Category,
    pub source: JobSource,
    pub raw_text: String,
    pub link: String,
    pub posted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    pub id: String,
    pub job_id: String,
    pub title: String,
    pub employer: String,
    pub employer_handle: Option<String>,
    pub location: String,
    #[schema(value_type = String)]
    pub category: Category,
    pub source: JobSource,
    pub raw_text: String,
    pub link: String,
    pub posted_at: Option<i64>,
    pub created_at: i64,
    pub views: i64,
    pub clicks: i64,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        JobResponse {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            job_id: job.job_id,
            title: job.title,
            employer: job.employer,
            employer_handle: job.employer_handle,
            location: job.location,
            category: job.category,
            source: job.source,
            raw_text: job.raw_text,
            link: job.link,
            posted_at: job.posted_at,
            created_at: job.created_at,
            views: job.views,
            clicks: job.clicks,
        }
    }
}

/// Query string of GET /api/v1/jobs
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobListQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSort {
    Latest,
    Popular,
}

impl JobSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "popular" => JobSort::Popular,
            _ => JobSort::Latest,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobListResponse {
    pub success: bool,
    pub jobs: Vec<JobResponse>,
    pub page: u64,
    pub limit: i64,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}
