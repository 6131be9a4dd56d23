use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static INGESTION_RUNS: AtomicU64 = AtomicU64::new(0);
static JOBS_INGESTED: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn record_ingestion_run(inserted: u64) {
    INGESTION_RUNS.fetch_add(1, Ordering::Relaxed);
    JOBS_INGESTED.fetch_add(inserted, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub ingestion_runs_total: u64,
    pub jobs_ingested_total: u64,
}

impl MetricsResponse {
    fn current() -> Self {
        MetricsResponse {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            ingestion_runs_total: INGESTION_RUNS.load(Ordering::Relaxed),
            jobs_ingested_total: JOBS_INGESTED.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition
    fn render(&self) -> String {
        let counters = [
            ("http_requests_total", "Total number of HTTP requests", self.http_requests_total),
            ("http_errors_total", "Total number of HTTP errors", self.http_errors_total),
            ("ingestion_runs_total", "Completed ingestion runs", self.ingestion_runs_total),
            ("jobs_ingested_total", "Jobs inserted by ingestion", self.jobs_ingested_total),
        ];

        counters
            .iter()
            .map(|(name, help, value)| {
                format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", body = String)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::current().render())
}
