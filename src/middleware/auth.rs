use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::services::auth_service;
use crate::utils::AppError;

pub use crate::services::auth_service::Claims;

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compares a presented secret with the configured one in constant time.
/// An unset secret never matches, which keeps the guarded endpoint closed.
pub fn shared_secret_matches(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(provided), Some(expected)) if !expected.is_empty() => {
            provided.len() == expected.len()
                && provided
                    .bytes()
                    .zip(expected.bytes())
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
        }
        _ => false,
    }
}

/// Verifies the bearer JWT and stores the `Claims` in request extensions.
/// `AuthMiddleware::admin()` additionally requires the admin role.
#[derive(Clone, Copy)]
pub struct AuthMiddleware {
    require_admin: bool,
}

impl AuthMiddleware {
    pub fn user() -> Self {
        Self { require_admin: false }
    }

    pub fn admin() -> Self {
        Self { require_admin: true }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            require_admin: self.require_admin,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    require_admin: bool,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match bearer_token(req.headers()) {
            Some(token) => auth_service::verify_token(token),
            None => Err(AppError::Unauthorized("Missing authorization token".to_string())),
        };

        let claims = match claims {
            Ok(claims) => claims,
            Err(e) => {
                log::debug!("🔒 Rejected {}: {}", req.path(), e);
                return Box::pin(async move { Err(e.into()) });
            }
        };

        if self.require_admin && !claims.is_admin() {
            log::warn!("🚫 Non-admin {} tried {}", claims.email(), req.path());
            return Box::pin(async move {
                Err(AppError::Forbidden("Admin role required".to_string()).into())
            });
        }

        req.extensions_mut().insert(claims);

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserProfile, ROLE_ADMIN, ROLE_USER};
    use actix_web::{http::StatusCode, test as atest, web, App, HttpResponse};

    fn token_for(role: &str) -> String {
        let user = User {
            id: None,
            email: "grace@example.com".into(),
            name: None,
            image: None,
            role: role.into(),
            is_active: true,
            profile: UserProfile::default(),
            bookmarks: vec![],
            last_ip: None,
            geo: None,
            created_at: 0,
            updated_at: 0,
            last_login: None,
        };
        auth_service::generate_jwt(&user).unwrap()
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.email().to_string())
    }

    #[actix_web::test]
    async fn test_missing_token_is_401() {
        let app = atest::init_service(
            App::new().service(web::scope("/me").wrap(AuthMiddleware::user()).route("", web::get().to(whoami))),
        )
        .await;

        let req = atest::TestRequest::get().uri("/me").to_request();
        let err = atest::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_token_passes_claims() {
        let app = atest::init_service(
            App::new().service(web::scope("/me").wrap(AuthMiddleware::user()).route("", web::get().to(whoami))),
        )
        .await;

        let req = atest::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token_for(ROLE_USER))))
            .to_request();
        let body = atest::call_and_read_body(&app, req).await;
        assert_eq!(body, "grace@example.com");
    }

    #[actix_web::test]
    async fn test_admin_scope_rejects_users() {
        let app = atest::init_service(
            App::new().service(web::scope("/admin").wrap(AuthMiddleware::admin()).route("", web::get().to(whoami))),
        )
        .await;

        let req = atest::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token_for(ROLE_USER))))
            .to_request();
        let err = atest::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);

        let req = atest::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token_for(ROLE_ADMIN))))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_shared_secret_matches() {
        assert!(shared_secret_matches(Some("s3cret"), Some("s3cret")));
        assert!(!shared_secret_matches(Some("s3cret"), Some("s3cre7")));
        assert!(!shared_secret_matches(Some("s3c"), Some("s3cret")));
        assert!(!shared_secret_matches(None, Some("s3cret")));
        assert!(!shared_secret_matches(Some(""), Some("")));
        assert!(!shared_secret_matches(Some("anything"), None));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
