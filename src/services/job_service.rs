use futures::stream::{StreamExt, TryStreamExt};
use mongodb::bson::{doc, oid::ObjectId, Document, Regex};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::{
    database::{MongoDB, JOBS},
    models::{CategoryCount, Job, JobListQuery, JobListResponse, JobResponse, JobSort, JobSource},
    services::{
        categorizer::{categorize, Category},
        location::{canonical_location, infer_location},
    },
    utils::AppError,
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

pub const MAX_PAGE: u64 = 10_000;

/// Clamps page (1..=10_000) and limit (1..=50); returns (page, limit, skip)
pub fn page_params(page: Option<u64>, limit: Option<i64>) -> (u64, i64, u64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let skip = (page - 1).saturating_mul(limit as u64);
    (page, limit, skip)
}

fn case_insensitive(pattern: &str) -> Regex {
    Regex {
        pattern: regex::escape(pattern),
        options: "i".to_string(),
    }
}

/// Builds the feed filter from the query string
pub fn build_filter(query: &JobListQuery) -> Result<Document, AppError> {
    let mut filter = Document::new();

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty() && *c != "all") {
        let category = category
            .parse::<Category>()
            .map_err(AppError::InvalidRequest)?;
        filter.insert("category", category.display_name());
    }

    if let Some(source) = query.source.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let source = JobSource::parse(source)
            .ok_or_else(|| AppError::InvalidRequest(format!("Unknown source: {}", source)))?;
        filter.insert("source", source.as_str());
    }

    if let Some(location) = query.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        let location = canonical_location(location).unwrap_or(location);
        filter.insert("location", case_insensitive(location));
    }

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        if q.chars().count() > 100 {
            return Err(AppError::InvalidRequest("Search query is too long".to_string()));
        }
        let regex = case_insensitive(q);
        filter.insert(
            "$or",
            vec![
                doc! { "title": regex.clone() },
                doc! { "raw_text": regex.clone() },
                doc! { "employer": regex },
            ],
        );
    }

    Ok(filter)
}

fn sort_doc(sort: JobSort) -> Document {
    match sort {
        JobSort::Latest => doc! { "created_at": -1, "_id": -1 },
        JobSort::Popular => doc! { "views": -1, "created_at": -1 },
    }
}

pub async fn list_jobs(db: &MongoDB, query: &JobListQuery) -> Result<JobListResponse, AppError> {
    let filter = build_filter(query)?;
    let (page, limit, skip) = page_params(query.page, query.limit);
    let sort = JobSort::parse(query.sort.as_deref());

    let collection = db.collection::<Job>(JOBS);

    let total = collection.count_documents(filter.clone()).await?;

    let jobs: Vec<JobResponse> = collection
        .find(filter)
        .sort(sort_doc(sort))
        .skip(skip)
        .limit(limit)
        .await?
        .map_ok(JobResponse::from)
        .try_collect()
        .await?;

    Ok(JobListResponse {
        success: true,
        has_more: skip + (jobs.len() as u64) < total,
        jobs,
        page,
        limit,
        total,
    })
}

/// Latest jobs matching a filter, used by the chat assistant
pub async fn latest_jobs(db: &MongoDB, filter: Document, limit: i64) -> Result<Vec<Job>, AppError> {
    let jobs = db
        .collection::<Job>(JOBS)
        .find(filter)
        .sort(sort_doc(JobSort::Latest))
        .limit(limit)
        .await?
        .try_collect()
        .await?;
    Ok(jobs)
}

pub async fn count_jobs(db: &MongoDB, filter: Document) -> Result<u64, AppError> {
    Ok(db.collection::<Job>(JOBS).count_documents(filter).await?)
}

/// Accepts either the Mongo ObjectId hex or the `job_id` upsert key
fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "job_id": id },
    }
}

pub async fn find_job(db: &MongoDB, id: &str) -> Result<Job, AppError> {
    db.collection::<Job>(JOBS)
        .find_one(id_filter(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
}

#[derive(Debug, Clone, Copy)]
pub enum JobCounter {
    Views,
    Clicks,
}

impl JobCounter {
    fn field(&self) -> &'static str {
        match self {
            JobCounter::Views => "views",
            JobCounter::Clicks => "clicks",
        }
    }
}

/// Atomic `$inc` of a counter; returns the updated job
pub async fn increment_counter(db: &MongoDB, id: &str, counter: JobCounter) -> Result<Job, AppError> {
    let mut inc = Document::new();
    inc.insert(counter.field(), 1i64);

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    db.collection::<Job>(JOBS)
        .find_one_and_update(id_filter(id), doc! { "$inc": inc })
        .with_options(options)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
}

pub async fn category_counts(db: &MongoDB) -> Result<Vec<CategoryCount>, AppError> {
    let pipeline = vec![
        doc! { "$group": { "_id": "$category", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
    ];

    let mut cursor = db.collection::<Document>(JOBS).aggregate(pipeline).await?;
    let mut counts = Vec::new();

    while let Some(result) = cursor.next().await {
        match result {
            Ok(row) => {
                let category = row.get_str("_id").unwrap_or("Other").to_string();
                let count = match row.get("count") {
                    Some(mongodb::bson::Bson::Int32(n)) => *n as i64,
                    Some(mongodb::bson::Bson::Int64(n)) => *n,
                    _ => 0,
                };
                counts.push(CategoryCount { category, count });
            }
            Err(e) => log::error!("❌ Error reading category count: {}", e),
        }
    }

    Ok(counts)
}

#[derive(Debug, Default, serde::Serialize)]
pub struct RecategorizeReport {
    pub scanned: u64,
    pub updated: u64,
}

/// Re-runs the keyword heuristics over every stored job
pub async fn recategorize_all(db: &MongoDB) -> Result<RecategorizeReport, AppError> {
    let collection = db.collection::<Job>(JOBS);
    let mut cursor = collection.find(doc! {}).await?;
    let mut report = RecategorizeReport::default();

    while let Some(result) = cursor.next().await {
        let job = match result {
            Ok(job) => job,
            Err(e) => {
                log::warn!("⚠️  Skipping unreadable job document: {}", e);
                continue;
            }
        };
        report.scanned += 1;

        let category = categorize(&job.raw_text);
        let location = infer_location(&job.raw_text);

        if category == job.category && location == job.location {
            continue;
        }

        let update = doc! {
            "$set": {
                "category": category.display_name(),
                "location": &location,
                "updated_at": chrono::Utc::now().timestamp(),
            }
        };

        match collection.update_one(doc! { "job_id": &job.job_id }, update).await {
            Ok(_) => report.updated += 1,
            Err(e) => log::warn!("⚠️  Recategorize failed for {}: {}", job.job_id, e),
        }
    }

    log::info!("🏷️  Recategorized {}/{} jobs", report.updated, report.scanned);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_clamp() {
        assert_eq!(page_params(None, None), (1, 20, 0));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_params(Some(3), Some(500)), (3, 50, 100));
        assert_eq!(page_params(Some(2), Some(-4)), (2, 1, 1));
    }

    #[test]
    fn test_page_params_huge_page_does_not_overflow() {
        let (page, limit, skip) = page_params(Some(u64::MAX), Some(50));
        assert_eq!(page, MAX_PAGE);
        assert_eq!(limit, 50);
        assert_eq!(skip, (MAX_PAGE - 1) * 50);
    }

    #[test]
    fn test_empty_query_matches_all() {
        let filter = build_filter(&JobListQuery::default()).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_filter_fields() {
        let query = JobListQuery {
            category: Some("full-stack".into()),
            source: Some("twitter".into()),
            location: Some("Berlin".into()),
            ..JobListQuery::default()
        };
        let filter = build_filter(&query).unwrap();

        assert_eq!(filter.get_str("category").unwrap(), "Full Stack");
        assert_eq!(filter.get_str("source").unwrap(), "x");
        match filter.get("location") {
            Some(mongodb::bson::Bson::RegularExpression(re)) => {
                assert_eq!(re.pattern, "Berlin");
                assert_eq!(re.options, "i");
            }
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn test_location_alias_is_canonicalized() {
        let query = JobListQuery {
            location: Some("nyc".into()),
            ..JobListQuery::default()
        };
        match build_filter(&query).unwrap().get("location") {
            Some(mongodb::bson::Bson::RegularExpression(re)) => assert_eq!(re.pattern, "New York"),
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn test_all_category_is_no_filter() {
        let query = JobListQuery {
            category: Some("all".into()),
            ..JobListQuery::default()
        };
        assert!(build_filter(&query).unwrap().is_empty());
    }

    #[test]
    fn test_search_text_is_escaped() {
        let query = JobListQuery {
            q: Some("c++ (senior)".into()),
            ..JobListQuery::default()
        };
        let filter = build_filter(&query).unwrap();
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 3);

        let title = or[0].as_document().unwrap();
        match title.get("title") {
            Some(mongodb::bson::Bson::RegularExpression(re)) => {
                assert_eq!(re.pattern, "c\\+\\+ \\(senior\\)");
            }
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_filters_rejected() {
        let bad_category = JobListQuery {
            category: Some("astronaut".into()),
            ..JobListQuery::default()
        };
        assert!(matches!(build_filter(&bad_category), Err(AppError::InvalidRequest(_))));

        let bad_source = JobListQuery {
            source: Some("myspace".into()),
            ..JobListQuery::default()
        };
        assert!(matches!(build_filter(&bad_source), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_id_filter() {
        let hex = "65a1f0c2e4b0a1b2c3d4e5f6";
        assert!(id_filter(hex).get_object_id("_id").is_ok());
        assert_eq!(id_filter("x:123").get_str("job_id").unwrap(), "x:123");
    }

    #[test]
    fn test_sort_orders() {
        assert_eq!(sort_doc(JobSort::Popular).keys().next().unwrap(), "views");
        assert_eq!(JobSort::parse(Some("POPULAR")), JobSort::Popular);
        assert_eq!(JobSort::parse(Some("whatever")), JobSort::Latest);
        assert_eq!(JobSort::parse(None), JobSort::Latest);
    }
}
