use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CategoryCount, JobListQuery, JobListResponse, JobResponse},
    services::job_service::{self, JobCounter},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "Jobs",
    params(JobListQuery),
    responses(
        (status = 200, description = "Paginated job feed", body = JobListResponse),
        (status = 400, description = "Unknown category or source")
    )
)]
pub async fn list_jobs(
    db: web::Data<MongoDB>,
    query: web::Query<JobListQuery>,
) -> Result<HttpResponse, AppError> {
    log::debug!("📋 GET /jobs - {:?}", query);

    let response = job_service::list_jobs(&db, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/categories",
    tag = "Jobs",
    responses((status = 200, description = "Job count per category", body = [CategoryCount]))
)]
pub async fn list_categories(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let categories = job_service::category_counts(&db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "categories": categories
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "ObjectId or job_id")),
    responses(
        (status = 200, description = "Job", body = JobResponse),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let job = job_service::find_job(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "job": JobResponse::from(job)
    })))
}

async fn bump(db: &MongoDB, id: &str, counter: JobCounter) -> Result<HttpResponse, AppError> {
    let job = job_service::increment_counter(db, id, counter).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "views": job.views,
        "clicks": job.clicks
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/jobs/{id}/view",
    tag = "Jobs",
    params(("id" = String, Path, description = "ObjectId or job_id")),
    responses(
        (status = 200, description = "View recorded"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn record_view(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    bump(&db, &path, JobCounter::Views).await
}

#[utoipa::path(
    post,
    path = "/api/v1/jobs/{id}/click",
    tag = "Jobs",
    params(("id" = String, Path, description = "ObjectId or job_id")),
    responses(
        (status = 200, description = "Click recorded"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn record_click(db: web::Data<MongoDB>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    bump(&db, &path, JobCounter::Clicks).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/jobs/recategorize",
    tag = "Admin",
    responses(
        (status = 200, description = "Scanned and updated counts"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn recategorize(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    log::info!("🏷️  POST /admin/jobs/recategorize by {}", claims.email());

    let report = job_service::recategorize_all(&db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "scanned": report.scanned,
        "updated": report.updated
    })))
}
