pub mod ingestion_scheduler;
pub mod maintenance_poller;
