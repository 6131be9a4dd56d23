pub mod alert_service;
pub mod auth_service;
pub mod bookmark_service;
pub mod categorizer;
pub mod chat_service;
pub mod contact_service;
pub mod geoip_service;
pub mod ingestion_service;
pub mod job_service;
pub mod location;
pub mod search_api_service;
pub mod settings_service;
pub mod subscriber_service;
pub mod user_service;
