use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    middleware::auth::{shared_secret_matches, Claims},
    models::UserInfo,
    services::{
        auth_service::{self, AuthResponse, SessionRequest},
        geoip_service::GeoIpClient,
    },
    utils::AppError,
};

pub const AUTH_SECRET_HEADER: &str = "X-Auth-Secret";

/// First `X-Forwarded-For` entry, else the peer address
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/session",
    tag = "Auth",
    request_body = SessionRequest,
    params(("X-Auth-Secret" = String, Header, description = "Secret shared with the web tier")),
    responses(
        (status = 200, description = "Session exchanged", body = AuthResponse),
        (status = 401, description = "Missing or wrong exchange secret"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn create_session(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    geoip: web::Data<GeoIpClient>,
    body: web::Json<SessionRequest>,
) -> Result<HttpResponse, AppError> {
    let provided = req
        .headers()
        .get(AUTH_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    if !shared_secret_matches(provided, config.auth_exchange_secret.as_deref()) {
        log::warn!("🚫 POST /auth/session rejected: bad exchange secret");
        return Err(AppError::Unauthorized("Invalid exchange secret".to_string()));
    }

    log::info!("🔐 POST /auth/session - email: {}", body.email);

    let response = auth_service::exchange_session(&db, &geoip, &body, client_ip(&req)).await?;

    log::info!("✅ Session issued for {}", response.user.email);
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let user = auth_service::get_current_user(&db, claims.email()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserInfo::from(user)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .peer_addr("10.0.0.2:5000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let req = TestRequest::default()
            .peer_addr("198.51.100.4:443".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req).as_deref(), Some("198.51.100.4"));

        assert_eq!(client_ip(&TestRequest::default().to_http_request()), None);
    }
}
