use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::LOCATION,
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::middleware::auth::bearer_token;
use crate::services::auth_service;
use crate::services::settings_service::{MaintenanceSnapshot, MaintenanceState};

pub const MAINTENANCE_PAGE: &str = "/maintenance";

const EXEMPT_PATHS: &[&str] = &[
    "/health",
    "/metrics",
    MAINTENANCE_PAGE,
    "/api/v1/settings/maintenance",
    "/api/v1/auth/session",
];

const EXEMPT_PREFIXES: &[&str] = &["/api/v1/admin", "/api/v1/cron", "/swagger-ui", "/api-docs"];

#[derive(Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// API callers get a 503 JSON body
    Unavailable,
    /// Page requests are sent to the static maintenance page
    Redirect,
}

pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path)
        || EXEMPT_PREFIXES
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

pub fn decide(path: &str, snapshot: &MaintenanceSnapshot, is_admin: bool) -> GuardDecision {
    if !snapshot.enabled || is_admin || is_exempt(path) {
        return GuardDecision::Pass;
    }

    if path.starts_with("/api/") {
        GuardDecision::Unavailable
    } else {
        GuardDecision::Redirect
    }
}

/// Blocks non-admin traffic while maintenance mode is on for this environment
pub struct MaintenanceGuard {
    state: MaintenanceState,
}

impl MaintenanceGuard {
    pub fn new(state: MaintenanceState) -> Self {
        Self { state }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MaintenanceGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = MaintenanceGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MaintenanceGuardMiddleware {
            service,
            state: self.state.clone(),
        }))
    }
}

pub struct MaintenanceGuardMiddleware<S> {
    service: S,
    state: MaintenanceState,
}

impl<S, B> Service<ServiceRequest> for MaintenanceGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let snapshot = self.state.snapshot();

        let decision = if snapshot.enabled {
            let is_admin = bearer_token(req.headers())
                .and_then(|token| auth_service::verify_token(token).ok())
                .map(|claims| claims.is_admin())
                .unwrap_or(false);
            decide(req.path(), &snapshot, is_admin)
        } else {
            GuardDecision::Pass
        };

        match decision {
            GuardDecision::Pass => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            GuardDecision::Unavailable => {
                let response = HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "success": false,
                    "maintenance": true,
                    "message": snapshot.message
                }));
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
            GuardDecision::Redirect => {
                let response = HttpResponse::TemporaryRedirect()
                    .insert_header((LOCATION, MAINTENANCE_PAGE))
                    .finish();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppEnvironment;
    use crate::models::{MaintenanceFlags, Setting};
    use actix_web::{http::StatusCode, test as atest, web, App};

    fn on() -> MaintenanceSnapshot {
        MaintenanceSnapshot {
            enabled: true,
            message: "Upgrading".into(),
        }
    }

    #[test]
    fn test_disabled_passes_everything() {
        let off = MaintenanceSnapshot {
            enabled: false,
            message: String::new(),
        };
        assert_eq!(decide("/api/v1/jobs", &off, false), GuardDecision::Pass);
        assert_eq!(decide("/", &off, false), GuardDecision::Pass);
    }

    #[test]
    fn test_enabled_blocks_api_and_pages() {
        assert_eq!(decide("/api/v1/jobs", &on(), false), GuardDecision::Unavailable);
        assert_eq!(decide("/jobs/123", &on(), false), GuardDecision::Redirect);
    }

    #[test]
    fn test_exemptions_and_admin_bypass() {
        assert_eq!(decide("/health", &on(), false), GuardDecision::Pass);
        assert_eq!(decide("/maintenance", &on(), false), GuardDecision::Pass);
        assert_eq!(decide("/api/v1/settings/maintenance", &on(), false), GuardDecision::Pass);
        assert_eq!(decide("/api/v1/admin/settings", &on(), false), GuardDecision::Pass);
        assert_eq!(decide("/api/v1/cron/ingest", &on(), false), GuardDecision::Pass);
        assert_eq!(decide("/swagger-ui/index.html", &on(), false), GuardDecision::Pass);
        assert_eq!(decide("/api/v1/jobs", &on(), true), GuardDecision::Pass);
    }

    #[test]
    fn test_prefix_needs_segment_boundary() {
        assert!(is_exempt("/api/v1/admin"));
        assert!(!is_exempt("/api/v1/administrators"));
    }

    #[actix_web::test]
    async fn test_guard_end_to_end() {
        let state = MaintenanceState::new(AppEnvironment::Production);
        state.apply(&Setting {
            maintenance: MaintenanceFlags {
                production: true,
                ..MaintenanceFlags::default()
            },
            ..Setting::default()
        });

        let app = atest::init_service(
            App::new()
                .wrap(MaintenanceGuard::new(state))
                .route("/api/v1/jobs", web::get().to(|| async { "jobs" }))
                .route("/feed", web::get().to(|| async { "feed" }))
                .route("/health", web::get().to(|| async { "ok" })),
        )
        .await;

        let resp = atest::call_service(&app, atest::TestRequest::get().uri("/api/v1/jobs").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["maintenance"], true);

        let resp = atest::call_service(&app, atest::TestRequest::get().uri("/feed").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), MAINTENANCE_PAGE);

        let resp = atest::call_service(&app, atest::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
