use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{ContactMessageResponse, UpdateUserRequest, UserInfo},
    services::{contact_service, user_service},
    utils::AppError,
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    params(PageQuery),
    responses((status = 200, description = "Users, newest first", body = [UserInfo])),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    db: web::Data<MongoDB>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (users, total) = user_service::list_users(&db, query.page, query.limit).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": total,
        "users": users
    })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/users/{email}",
    tag = "Admin",
    params(("email" = String, Path, description = "User email")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserInfo),
        (status = 400, description = "Unknown role or empty update"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let email = path.trim().to_lowercase();

    if email == claims.email() && (body.is_active == Some(false) || body.role.is_some()) {
        return Err(AppError::InvalidRequest(
            "Admins cannot change their own role or deactivate themselves".to_string(),
        ));
    }

    let user = user_service::update_user(&db, &email, &body, claims.email()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserInfo::from(user)
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/contact",
    tag = "Admin",
    params(PageQuery),
    responses((status = 200, description = "Contact messages, newest first", body = [ContactMessageResponse])),
    security(("bearer_auth" = []))
)]
pub async fn list_contact_messages(
    db: web::Data<MongoDB>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let messages = contact_service::list_contact_messages(&db, query.page, query.limit).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": messages.len(),
        "messages": messages
    })))
}
