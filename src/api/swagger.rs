use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Job Feed Service API",
        version = "1.0.0",
        description = "Backend of the job-discovery app.\n\n**Authentication:** user endpoints take the JWT issued by `POST /api/v1/auth/session` as a Bearer token. Admin endpoints additionally require the `admin` role.\n\n**Features:**\n- Hiring posts ingested from social search, categorized and geolocated\n- Paginated, filterable job feed\n- Bookmarks and profiles\n- Rule-based chat assistant\n- Email-alert subscriptions\n- Per-environment maintenance mode",
        contact(name = "Job Feed Team")
    ),
    paths(
        // Auth & profile
        crate::api::auth::create_session,
        crate::api::auth::get_me,
        crate::api::profile::get_profile,
        crate::api::profile::update_profile,

        // Jobs
        crate::api::jobs::list_jobs,
        crate::api::jobs::list_categories,
        crate::api::jobs::get_job,
        crate::api::jobs::record_view,
        crate::api::jobs::record_click,

        // Bookmarks
        crate::api::bookmarks::list_bookmarks,
        crate::api::bookmarks::toggle_bookmark,
        crate::api::bookmarks::delete_bookmark,

        // Public forms
        crate::api::subscribe::subscribe,
        crate::api::subscribe::unsubscribe,
        crate::api::chat::chat,
        crate::api::contact::submit_contact,
        crate::api::settings::maintenance_status,

        // Admin
        crate::api::settings::get_settings,
        crate::api::settings::update_maintenance,
        crate::api::jobs::recategorize,
        crate::api::admin::list_users,
        crate::api::admin::update_user,
        crate::api::admin::list_contact_messages,
        crate::api::ingestion::admin_ingest,
        crate::api::ingestion::cron_ingest,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::services::auth_service::SessionRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,
            crate::models::UserProfile,
            crate::models::GeoLocation,
            crate::models::UpdateProfileRequest,
            crate::models::UpdateUserRequest,

            crate::models::JobSource,
            crate::models::JobResponse,
            crate::models::JobListResponse,
            crate::models::CategoryCount,
            crate::models::Bookmark,
            crate::api::bookmarks::ToggleBookmarkRequest,

            crate::models::SubscribeRequest,
            crate::models::UnsubscribeRequest,
            crate::services::chat_service::ChatRequest,
            crate::services::chat_service::ChatResponse,
            crate::models::ContactRequest,
            crate::models::ContactMessageResponse,

            crate::models::Setting,
            crate::models::MaintenanceFlags,
            crate::models::UpdateMaintenanceRequest,
            crate::models::MaintenanceStatusResponse,

            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Session exchange and the current user."),
        (name = "Profile", description = "Free-text profile of the signed-in user."),
        (name = "Jobs", description = "Job feed, categories and engagement counters."),
        (name = "Bookmarks", description = "Saved jobs of the signed-in user."),
        (name = "Subscribers", description = "Email-alert subscriptions."),
        (name = "Chat", description = "Rule-based job assistant."),
        (name = "Contact", description = "Contact form."),
        (name = "Settings", description = "Public maintenance status."),
        (name = "Admin", description = "Admin-only operations. Requires the admin role."),
        (name = "Ingestion", description = "Scheduled ingestion trigger."),
        (name = "Health", description = "Health check and Prometheus metrics."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT from POST /api/v1/auth/session"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_feed_and_admin_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/jobs"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/settings/maintenance"));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }
}
