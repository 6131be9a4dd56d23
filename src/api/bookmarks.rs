use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::Bookmark,
    services::bookmark_service,
    utils::AppError,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ToggleBookmarkRequest {
    pub job_id: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/bookmarks",
    tag = "Bookmarks",
    responses((status = 200, description = "Bookmarks, newest first", body = [Bookmark])),
    security(("bearer_auth" = []))
)]
pub async fn list_bookmarks(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let bookmarks = bookmark_service::list_bookmarks(&db, claims.email()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": bookmarks.len(),
        "bookmarks": bookmarks
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookmarks/toggle",
    tag = "Bookmarks",
    request_body = ToggleBookmarkRequest,
    responses(
        (status = 200, description = "New bookmark state"),
        (status = 404, description = "Job not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_bookmark(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    body: web::Json<ToggleBookmarkRequest>,
) -> Result<HttpResponse, AppError> {
    let job_id = body.job_id.trim();
    if job_id.is_empty() {
        return Err(AppError::InvalidRequest("job_id is required".to_string()));
    }

    let bookmarked = bookmark_service::toggle_bookmark(&db, claims.email(), job_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "bookmarked": bookmarked
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookmarks/{job_id}",
    tag = "Bookmarks",
    params(("job_id" = String, Path, description = "Bookmarked job_id")),
    responses(
        (status = 200, description = "Bookmark removed"),
        (status = 404, description = "Bookmark not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_bookmark(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    bookmark_service::remove_bookmark(&db, claims.email(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "bookmarked": false
    })))
}
