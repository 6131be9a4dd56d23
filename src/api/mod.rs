pub mod admin;
pub mod auth;
pub mod bookmarks;
pub mod chat;
pub mod contact;
pub mod health;
pub mod ingestion;
pub mod jobs;
pub mod metrics;
pub mod profile;
pub mod settings;
pub mod subscribe;
pub mod swagger;
