pub mod auth;
pub mod maintenance;
pub mod security_headers;

pub use maintenance::MaintenanceGuard;
pub use security_headers::SecurityHeaders;
