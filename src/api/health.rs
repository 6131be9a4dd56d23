use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::{
    database::MongoDB,
    services::{ingestion_service::Ingestor, settings_service::MaintenanceState},
};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
    pub environment: String,
    pub database: bool,
    pub ingestion_running: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(
    db: web::Data<MongoDB>,
    maintenance: web::Data<MaintenanceState>,
    ingestor: web::Data<Ingestor>,
) -> impl Responder {
    let database = db.health_check().await;

    let body = HealthResponse {
        status: if database { "healthy" } else { "degraded" }.to_string(),
        service: "job-feed-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        environment: maintenance.environment().to_string(),
        database,
        ingestion_running: ingestor.is_running(),
    };

    if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
