use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    services::chat_service::{self, ChatRequest, ChatResponse},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Empty or oversized message")
    )
)]
pub async fn chat(db: web::Data<MongoDB>, body: web::Json<ChatRequest>) -> Result<HttpResponse, AppError> {
    let response = chat_service::respond(&db, &body.message).await?;
    Ok(HttpResponse::Ok().json(response))
}
