use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{UpdateProfileRequest, UserInfo},
    services::{auth_service, user_service},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "Profile",
    responses((status = 200, description = "Current profile", body = UserInfo)),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user = auth_service::get_current_user(&db, claims.email()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserInfo::from(user)
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "Profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserInfo),
        (status = 400, description = "Field too long or malformed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 PUT /profile - {}", claims.email());

    let user = user_service::update_profile(&db, claims.email(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserInfo::from(user)
    })))
}
