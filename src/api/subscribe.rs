use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{SubscribeRequest, UnsubscribeRequest},
    services::subscriber_service::{self, SubscribeOutcome},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/subscribe",
    tag = "Subscribers",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed"),
        (status = 200, description = "Already subscribed (reactivated when inactive)"),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn subscribe(
    db: web::Data<MongoDB>,
    body: web::Json<SubscribeRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = subscriber_service::subscribe(&db, &body.email, body.preferences.as_deref()).await?;

    let response = match outcome {
        SubscribeOutcome::Created => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "already_subscribed": false,
            "message": "Subscribed to job alerts"
        })),
        SubscribeOutcome::AlreadySubscribed | SubscribeOutcome::Reactivated => {
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "already_subscribed": true,
                "reactivated": outcome == SubscribeOutcome::Reactivated
            }))
        }
    };

    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/api/v1/subscribe",
    tag = "Subscribers",
    request_body = UnsubscribeRequest,
    responses(
        (status = 200, description = "Unsubscribed"),
        (status = 404, description = "Unknown subscriber")
    )
)]
pub async fn unsubscribe(
    db: web::Data<MongoDB>,
    body: web::Json<UnsubscribeRequest>,
) -> Result<HttpResponse, AppError> {
    subscriber_service::unsubscribe(&db, &body.email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Unsubscribed"
    })))
}
