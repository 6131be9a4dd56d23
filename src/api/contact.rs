use actix_web::{web, HttpResponse};

use crate::{database::MongoDB, models::ContactRequest, services::contact_service, utils::AppError};

#[utoipa::path(
    post,
    path = "/api/v1/contact",
    tag = "Contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored"),
        (status = 400, description = "Missing or invalid fields")
    )
)]
pub async fn submit_contact(
    db: web::Data<MongoDB>,
    body: web::Json<ContactRequest>,
) -> Result<HttpResponse, AppError> {
    let id = contact_service::submit_contact(&db, &body).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "id": id
    })))
}
