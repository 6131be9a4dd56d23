use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    middleware::auth::{bearer_token, shared_secret_matches, Claims},
    services::ingestion_service::Ingestor,
    utils::AppError,
};

async fn run(db: &MongoDB, ingestor: &Ingestor) -> Result<HttpResponse, AppError> {
    let report = ingestor.run(db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "report": report
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/cron/ingest",
    tag = "Ingestion",
    responses(
        (status = 200, description = "Ingestion report"),
        (status = 401, description = "Missing or wrong cron secret"),
        (status = 503, description = "A run is already in progress")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cron_ingest(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    ingestor: web::Data<Ingestor>,
) -> Result<HttpResponse, AppError> {
    if !shared_secret_matches(bearer_token(req.headers()), config.cron_secret.as_deref()) {
        log::warn!("🚫 POST /cron/ingest rejected");
        return Err(AppError::Unauthorized("Invalid cron secret".to_string()));
    }

    log::info!("⏰ POST /cron/ingest");
    run(&db, &ingestor).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/ingest",
    tag = "Admin",
    responses(
        (status = 200, description = "Ingestion report"),
        (status = 503, description = "A run is already in progress")
    ),
    security(("bearer_auth" = []))
)]
pub async fn admin_ingest(
    db: web::Data<MongoDB>,
    ingestor: web::Data<Ingestor>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    log::info!("📥 POST /admin/ingest by {}", claims.email());
    run(&db, &ingestor).await
}
