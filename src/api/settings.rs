use actix_web::{web, HttpResponse};

use crate::{
    config::AppEnvironment,
    database::MongoDB,
    middleware::auth::Claims,
    models::{MaintenanceStatusResponse, Setting, UpdateMaintenanceRequest},
    services::settings_service::{self, MaintenanceState},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/v1/settings/maintenance",
    tag = "Settings",
    responses((status = 200, description = "Maintenance status of this deployment", body = MaintenanceStatusResponse))
)]
pub async fn maintenance_status(state: web::Data<MaintenanceState>) -> HttpResponse {
    let snapshot = state.snapshot();

    HttpResponse::Ok().json(MaintenanceStatusResponse {
        success: true,
        enabled: snapshot.enabled,
        message: snapshot.message,
        environment: state.environment().to_string(),
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn render_maintenance_page(message: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Under maintenance</title>\n</head>\n<body>\n\
         <main style=\"max-width:32rem;margin:20vh auto;font-family:sans-serif;text-align:center\">\n\
         <h1>Under maintenance</h1>\n<p>{}</p>\n</main>\n</body>\n</html>\n",
        escape_html(message)
    )
}

/// Target of the maintenance redirect
pub async fn maintenance_page(state: web::Data<MaintenanceState>) -> HttpResponse {
    let snapshot = state.snapshot();

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-store"))
        .body(render_maintenance_page(&snapshot.message))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/settings",
    tag = "Admin",
    responses((status = 200, description = "Global settings document", body = Setting)),
    security(("bearer_auth" = []))
)]
pub async fn get_settings(db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    let setting = settings_service::load_settings(&db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "settings": setting
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/settings/maintenance",
    tag = "Admin",
    request_body = UpdateMaintenanceRequest,
    responses(
        (status = 200, description = "Updated settings", body = Setting),
        (status = 400, description = "Unknown environment")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_maintenance(
    db: web::Data<MongoDB>,
    state: web::Data<MaintenanceState>,
    claims: web::ReqData<Claims>,
    body: web::Json<UpdateMaintenanceRequest>,
) -> Result<HttpResponse, AppError> {
    let environment = match body.environment.as_deref() {
        Some(env) => env.parse::<AppEnvironment>().map_err(AppError::InvalidRequest)?,
        None => state.environment(),
    };

    log::warn!(
        "🛠️  PUT /admin/settings/maintenance - {} sets {} to {}",
        claims.email(),
        environment,
        body.enabled
    );

    let setting = settings_service::update_maintenance(
        &db,
        environment,
        body.enabled,
        body.message.as_deref(),
        claims.email(),
    )
    .await?;

    // Takes effect here right away; other instances pick it up on their next poll
    state.apply(&setting);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "settings": setting
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, test as atest, App};

    #[test]
    fn test_page_escapes_message() {
        let html = render_maintenance_page("<b>Back at 5 & 6</b>");
        assert!(html.contains("&lt;b&gt;Back at 5 &amp; 6&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[actix_web::test]
    async fn test_public_status_reports_environment() {
        let state = MaintenanceState::new(AppEnvironment::Preview);
        let app = atest::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/status", web::get().to(maintenance_status)),
        )
        .await;

        let req = atest::TestRequest::get().uri("/status").to_request();
        let body: serde_json::Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body["enabled"], false);
        assert_eq!(body["environment"], "preview");
    }

    #[actix_web::test]
    async fn test_maintenance_page_is_html() {
        let state = MaintenanceState::new(AppEnvironment::Production);
        let resp = maintenance_page(web::Data::new(state)).await;
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(std::str::from_utf8(&body).unwrap().contains("Under maintenance"));
    }
}
