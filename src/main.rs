mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{dev::Service, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppConfig,
    middleware::auth::AuthMiddleware,
    services::{
        alert_service::LogAlertDispatcher,
        geoip_service::GeoIpClient,
        ingestion_service::Ingestor,
        search_api_service::{LinkedinSearchClient, PostSource, SearchApiClient},
        settings_service::MaintenanceState,
    },
    utils::AppError,
};

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io_error)?;

    log::info!("🚀 Starting Job Feed Service ({})...", config.environment);
    if services::auth_service::jwt_secret_is_default() {
        log::warn!("⚠️  JWT_SECRET is not set, signing tokens with the built-in default secret");
    }

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| io_error(format!("Failed to connect to MongoDB: {}", e)))?;

    log::info!("✅ MongoDB connected successfully");

    // Maintenance flag cache, loaded once before serving
    let maintenance = MaintenanceState::new(config.environment);
    jobs::maintenance_poller::start_maintenance_poller(db.clone(), maintenance.clone(), config.maintenance_poll).await;

    let geoip = GeoIpClient::new(config.geoip_url.clone());

    // Search sources
    if config.search_api.api_key.is_none() {
        log::warn!("⚠️  SEARCH_API_KEY not set, ingestion searches will fail");
    }
    let mut sources: Vec<Arc<dyn PostSource>> = vec![Arc::new(SearchApiClient::new(config.search_api.clone()))];
    if let Some(linkedin_url) = config.search_api.linkedin_url.clone() {
        log::info!("🔗 LinkedIn source enabled");
        sources.push(Arc::new(LinkedinSearchClient::new(
            linkedin_url,
            config.search_api.linkedin_host.clone(),
            config.search_api.api_key.clone(),
        )));
    }

    let ingestor = Arc::new(Ingestor::new(sources, Arc::new(LogAlertDispatcher), config.ingestion_delay));

    log::info!("📅 Starting background jobs...");
    jobs::ingestion_scheduler::start_ingestion_scheduler(
        db.clone(),
        ingestor.clone(),
        config.ingestion_interval,
        config.ingestion_enabled,
    )
    .await;
    log::info!("✅ Background jobs started");

    let host = config.host.clone();
    let port = config.port;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);
    let maintenance_data = web::Data::new(maintenance.clone());
    let geoip_data = web::Data::new(geoip);
    let ingestor_data = web::Data::from(ingestor);

    // Generate OpenAPI specification
    let openapi = api::swagger::ApiDoc::openapi();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = config_data
            .cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(maintenance_data.clone())
            .app_data(geoip_data.clone())
            .app_data(ingestor_data.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(64 * 1024)
                    .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
            )
            .wrap(middleware::MaintenanceGuard::new(maintenance.clone()))
            .wrap(middleware::SecurityHeaders)
            .wrap(cors)
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                srv.call(req)
            })
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .route("/maintenance", web::get().to(api::settings::maintenance_page))
            // Auth endpoints
            .service(
                web::scope("/api/v1/auth")
                    .route("/session", web::post().to(api::auth::create_session))
                    .service(
                        web::resource("/me")
                            .wrap(AuthMiddleware::user())
                            .route(web::get().to(api::auth::get_me)),
                    ),
            )
            // Jobs feed (public)
            .service(
                web::scope("/api/v1/jobs")
                    .route("", web::get().to(api::jobs::list_jobs))
                    .route("/categories", web::get().to(api::jobs::list_categories))
                    .route("/{id}", web::get().to(api::jobs::get_job))
                    .route("/{id}/view", web::post().to(api::jobs::record_view))
                    .route("/{id}/click", web::post().to(api::jobs::record_click)),
            )
            .service(
                web::scope("/api/v1/bookmarks")
                    .wrap(AuthMiddleware::user())
                    .route("", web::get().to(api::bookmarks::list_bookmarks))
                    .route("/toggle", web::post().to(api::bookmarks::toggle_bookmark))
                    .route("/{job_id}", web::delete().to(api::bookmarks::delete_bookmark)),
            )
            .service(
                web::scope("/api/v1/profile")
                    .wrap(AuthMiddleware::user())
                    .route("", web::get().to(api::profile::get_profile))
                    .route("", web::put().to(api::profile::update_profile)),
            )
            .service(
                web::resource("/api/v1/subscribe")
                    .route(web::post().to(api::subscribe::subscribe))
                    .route(web::delete().to(api::subscribe::unsubscribe)),
            )
            .route("/api/v1/chat", web::post().to(api::chat::chat))
            .route("/api/v1/contact", web::post().to(api::contact::submit_contact))
            .route("/api/v1/settings/maintenance", web::get().to(api::settings::maintenance_status))
            .route("/api/v1/cron/ingest", web::post().to(api::ingestion::cron_ingest))
            // ==================== ADMIN ====================
            .service(
                web::scope("/api/v1/admin")
                    .wrap(AuthMiddleware::admin())
                    .route("/settings", web::get().to(api::settings::get_settings))
                    .route("/settings/maintenance", web::put().to(api::settings::update_maintenance))
                    .route("/jobs/recategorize", web::post().to(api::jobs::recategorize))
                    .route("/ingest", web::post().to(api::ingestion::admin_ingest))
                    .route("/users", web::get().to(api::admin::list_users))
                    .route("/users/{email}", web::patch().to(api::admin::update_user))
                    .route("/contact", web::get().to(api::admin::list_contact_messages)),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
