use mongodb::bson::{doc, Document};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    database::{MongoDB, JOBS},
    models::{JobSource, NewJob},
    services::{
        alert_service::{self, AlertDispatcher},
        categorizer::{categorize, Category},
        location::infer_location,
        search_api_service::{PostSource, RawPost},
    },
    utils::{
        text::{collapse_whitespace, contains_term, truncate_chars},
        AppError,
    },
};

const TITLE_MAX_CHARS: usize = 120;

/// A post must mention at least one of these to count as a job post
const HIRING_MARKERS: &[&str] = &[
    "hiring",
    "we're hiring",
    "we are hiring",
    "job",
    "jobs",
    "role",
    "roles",
    "position",
    "opening",
    "openings",
    "vacancy",
    "looking for",
    "apply",
];

#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestionReport {
    pub categories: usize,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub alerts_sent: usize,
    pub started_at: i64,
    pub finished_at: i64,
    #[serde(skip)]
    pub new_jobs: Vec<NewJob>,
}

/// Turns a raw post into a job, or drops it when it is not a hiring post
pub fn normalize(post: &RawPost, source: JobSource) -> Option<NewJob> {
    let text = post.text.trim();
    if text.is_empty() || post.post_id.trim().is_empty() {
        return None;
    }

    let lowered = text.to_lowercase();
    if !HIRING_MARKERS.iter().any(|marker| contains_term(&lowered, marker)) {
        return None;
    }

    let category = categorize(text);

    let title = extract_title(text).unwrap_or_else(|| format!("{} role", category));

    let employer_handle = post
        .author_handle
        .as_ref()
        .map(|h| h.trim().trim_start_matches('@').to_string())
        .filter(|h| !h.is_empty());

    let employer = post
        .author_name
        .as_ref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| employer_handle.as_ref().map(|h| format!("@{}", h)))
        .unwrap_or_else(|| "Unknown".to_string());

    let link = post
        .url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| default_link(source, &post.post_id, employer_handle.as_deref()));

    Some(NewJob {
        job_id: format!("{}:{}", source.as_str(), post.post_id.trim()),
        title,
        employer,
        employer_handle,
        location: infer_location(text),
        category,
        source,
        raw_text: text.to_string(),
        link,
        posted_at: post.created_at,
    })
}

/// First line with real content, URLs removed, whitespace collapsed, capped length
fn extract_title(text: &str) -> Option<String> {
    text.lines()
        .map(|line| {
            let without_urls: Vec<&str> = line
                .split_whitespace()
                .filter(|word| !word.starts_with("http://") && !word.starts_with("https://"))
                .collect();
            collapse_whitespace(&without_urls.join(" "))
        })
        .find(|line| line.chars().any(|c| c.is_alphanumeric()))
        .map(|line| truncate_chars(&line, TITLE_MAX_CHARS))
}

fn default_link(source: JobSource, post_id: &str, handle: Option<&str>) -> String {
    match (source, handle) {
        (JobSource::X, Some(handle)) => format!("https://x.com/{}/status/{}", handle, post_id),
        (JobSource::X, None) => format!("https://x.com/i/web/status/{}", post_id),
        (JobSource::Linkedin, _) => format!("https://www.linkedin.com/feed/update/{}", post_id),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Upserts on `job_id`: content fields are refreshed, counters only set on insert
/// Content goes through `$set`; counters and `created_at` only on insert.
pub fn upsert_update(job: &NewJob, now: i64) -> Document {
    doc! {
        "$set": {
            "title": &job.title,
            "employer": &job.employer,
            "employer_handle": job.employer_handle.as_deref(),
            "location": &job.location,
            "category": job.category.display_name(),
            "source": job.source.as_str(),
            "raw_text": &job.raw_text,
            "link": &job.link,
            "posted_at": job.posted_at,
            "updated_at": now,
        },
        "$setOnInsert": {
            "job_id": &job.job_id,
            "created_at": now,
            "views": 0i64,
            "clicks": 0i64,
        }
    }
}

pub async fn upsert_job(db: &MongoDB, job: &NewJob) -> Result<UpsertOutcome, AppError> {
    let update = upsert_update(job, chrono::Utc::now().timestamp());

    let result = db
        .collection::<Document>(JOBS)
        .update_one(doc! { "job_id": &job.job_id }, update)
        .upsert(true)
        .await?;

    Ok(if result.upserted_id.is_some() {
        UpsertOutcome::Inserted
    } else if result.modified_count > 0 {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Unchanged
    })
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sequential ingestion over every category and configured source.
/// Only one run at a time per process.
pub struct Ingestor {
    sources: Vec<Arc<dyn PostSource>>,
    dispatcher: Arc<dyn AlertDispatcher>,
    delay: Duration,
    running: AtomicBool,
}

impl Ingestor {
    pub fn new(
        sources: Vec<Arc<dyn PostSource>>,
        dispatcher: Arc<dyn AlertDispatcher>,
        delay: Duration,
    ) -> Self {
        Self {
            sources,
            dispatcher,
            delay,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claims the run slot. The slot is released when the guard drops, so a
    /// cancelled run (client disconnect, timeout) never leaves it held.
    fn begin(&self) -> Result<RunGuard<'_>, AppError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| RunGuard(&self.running))
            .map_err(|_| {
                AppError::ServiceUnavailable("An ingestion run is already in progress".to_string())
            })
    }

    pub async fn run(&self, db: &MongoDB) -> Result<IngestionReport, AppError> {
        let _guard = self.begin()?;
        Ok(self.run_inner(db).await)
    }

    async fn run_inner(&self, db: &MongoDB) -> IngestionReport {
        let mut report = IngestionReport {
            started_at: chrono::Utc::now().timestamp(),
            ..IngestionReport::default()
        };

        log::info!(
            "📥 Ingestion started: {} categories × {} source(s)",
            Category::ALL.len(),
            self.sources.len()
        );

        for (i, category) in Category::ALL.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }
            report.categories += 1;

            for source in &self.sources {
                let posts = match source.search(category.search_query()).await {
                    Ok(posts) => posts,
                    Err(e) => {
                        report.errors += 1;
                        log::error!(
                            "  ❌ {} search failed for {}: {}",
                            source.source().as_str(),
                            category,
                            e
                        );
                        continue;
                    }
                };

                report.fetched += posts.len();

                for post in &posts {
                    let Some(job) = normalize(post, source.source()) else {
                        report.skipped += 1;
                        continue;
                    };

                    match upsert_job(db, &job).await {
                        Ok(UpsertOutcome::Inserted) => {
                            report.inserted += 1;
                            report.new_jobs.push(job);
                        }
                        Ok(UpsertOutcome::Updated) => report.updated += 1,
                        Ok(UpsertOutcome::Unchanged) => report.skipped += 1,
                        Err(e) => {
                            report.errors += 1;
                            log::error!("  ❌ Upsert failed for {}: {}", job.job_id, e);
                        }
                    }
                }
            }

            log::debug!("  📂 {} done ({} fetched so far)", category, report.fetched);
        }

        if !report.new_jobs.is_empty() {
            match alert_service::dispatch_alerts(db, self.dispatcher.as_ref(), &report.new_jobs).await {
                Ok(sent) => report.alerts_sent = sent,
                Err(e) => log::warn!("⚠️  Alert dispatch skipped: {}", e),
            }
        }

        report.finished_at = chrono::Utc::now().timestamp();

        log::info!(
            "📊 Ingestion summary: {} fetched, {} inserted, {} updated, {} skipped, {} errors",
            report.fetched,
            report.inserted,
            report.updated,
            report.skipped,
            report.errors
        );

        crate::api::metrics::record_ingestion_run(report.inserted as u64);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, text: &str) -> RawPost {
        RawPost {
            post_id: id.to_string(),
            text: text.to_string(),
            author_name: Some("Acme Robotics".to_string()),
            author_handle: Some("@acmebots".to_string()),
            url: None,
            created_at: Some(1_700_000_000),
        }
    }

    #[test]
    fn test_normalize_hiring_post() {
        let raw = post(
            "1790",
            "We're hiring a Senior Rust Backend Engineer https://acme.dev/jobs\nFully remote, apply below!",
        );
        let job = normalize(&raw, JobSource::X).unwrap();

        assert_eq!(job.job_id, "x:1790");
        assert_eq!(job.title, "We're hiring a Senior Rust Backend Engineer");
        assert_eq!(job.employer, "Acme Robotics");
        assert_eq!(job.employer_handle.as_deref(), Some("acmebots"));
        assert_eq!(job.category, Category::Backend);
        assert_eq!(job.location, "Remote");
        assert_eq!(job.link, "https://x.com/acmebots/status/1790");
        assert_eq!(job.posted_at, Some(1_700_000_000));
    }

    #[test]
    fn test_non_hiring_posts_are_dropped() {
        assert!(normalize(&post("1", "Just shipped a new feature 🚀"), JobSource::X).is_none());
        assert!(normalize(&post("2", "   "), JobSource::X).is_none());
        assert!(normalize(&post("", "We're hiring!"), JobSource::X).is_none());
    }

    #[test]
    fn test_title_is_truncated_and_skips_url_only_lines() {
        let long_line = "hiring ".repeat(40);
        let raw = post("3", &format!("https://t.co/abc\n{}", long_line));
        let job = normalize(&raw, JobSource::X).unwrap();

        assert!(!job.title.contains("https://"));
        assert!(job.title.chars().count() <= TITLE_MAX_CHARS);
        assert!(job.title.ends_with('…'));
    }

    #[test]
    fn test_employer_and_link_fallbacks() {
        let raw = RawPost {
            post_id: "77".into(),
            text: "Open role: product designer in Lisbon".into(),
            ..RawPost::default()
        };
        let job = normalize(&raw, JobSource::X).unwrap();
        assert_eq!(job.employer, "Unknown");
        assert_eq!(job.link, "https://x.com/i/web/status/77");
        assert_eq!(job.location, "Lisbon, Portugal");
        assert_eq!(job.category, Category::Design);

        let li = normalize(&raw, JobSource::Linkedin).unwrap();
        assert_eq!(li.job_id, "linkedin:77");
        assert_eq!(li.link, "https://www.linkedin.com/feed/update/77");
    }

    #[test]
    fn test_job_id_is_deterministic() {
        let a = normalize(&post("42", "Hiring a QA engineer"), JobSource::X).unwrap();
        let b = normalize(&post("42", "Hiring a QA engineer (updated)"), JobSource::X).unwrap();
        assert_eq!(a.job_id, b.job_id);
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl PostSource for FailingSource {
        fn source(&self) -> JobSource {
            JobSource::X
        }

        async fn search(&self, _query: &str) -> Result<Vec<RawPost>, AppError> {
            Err(AppError::ExternalApiError("quota exceeded".into()))
        }
    }

    #[test]
    fn test_upsert_keeps_counters_on_insert_only() {
        let job = normalize(&post("42", "Hiring a frontend developer in Berlin"), JobSource::X).unwrap();
        let update = upsert_update(&job, 1_700_000_100);

        let set = update.get_document("$set").unwrap();
        let on_insert = update.get_document("$setOnInsert").unwrap();

        for key in ["views", "clicks", "created_at", "job_id"] {
            assert!(!set.contains_key(key), "{} must not be overwritten", key);
            assert!(on_insert.contains_key(key));
        }
        assert_eq!(on_insert.get_i64("views").unwrap(), 0);
        assert_eq!(set.get_str("title").unwrap(), job.title);
        assert_eq!(set.get_i64("updated_at").unwrap(), 1_700_000_100);
    }

    #[tokio::test]
    async fn test_cancelled_run_releases_slot() {
        let ingestor = Ingestor::new(
            vec![Arc::new(FailingSource)],
            Arc::new(alert_service::LogAlertDispatcher),
            Duration::from_secs(3600),
        );

        let stalled = async {
            let _guard = ingestor.begin()?;
            assert!(ingestor.is_running());
            assert!(ingestor.begin().is_err());
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), AppError>(())
        };
        let timed_out = tokio::time::timeout(Duration::from_millis(20), stalled).await;

        assert!(timed_out.is_err());
        assert!(!ingestor.is_running());
        assert!(ingestor.begin().is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_failing_source_is_counted_not_fatal() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/JobFeedTest".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let ingestor = Ingestor::new(
            vec![Arc::new(FailingSource)],
            Arc::new(alert_service::LogAlertDispatcher),
            Duration::from_millis(0),
        );

        let report = ingestor.run(&db).await.unwrap();
        assert_eq!(report.errors, Category::ALL.len());
        assert_eq!(report.inserted, 0);
        assert!(!ingestor.is_running());
    }
}
