use serde::{Deserialize, Serialize};

use crate::config::AppEnvironment;

pub const GLOBAL_SETTINGS_KEY: &str = "global";
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "We're doing some maintenance right now. Please check back soon.";

/// Maintenance flag per deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MaintenanceFlags {
    #[serde(default)]
    pub development: bool,
    #[serde(default)]
    pub preview: bool,
    #[serde(default)]
    pub production: bool,
}

impl MaintenanceFlags {
    pub fn get(&self, env: AppEnvironment) -> bool {
        match env {
            AppEnvironment::Development => self.development,
            AppEnvironment::Preview => self.preview,
            AppEnvironment::Production => self.production,
        }
    }
}

/// The single global settings document
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Setting {
    pub key: String,
    #[serde(default)]
    pub maintenance: MaintenanceFlags,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

fn default_message() -> String {
    DEFAULT_MAINTENANCE_MESSAGE.to_string()
}

impl Default for Setting {
    fn default() -> Self {
        Setting {
            key: GLOBAL_SETTINGS_KEY.to_string(),
            maintenance: MaintenanceFlags::default(),
            message: default_message(),
            updated_at: None,
            updated_by: None,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateMaintenanceRequest {
    /// Defaults to the environment this instance runs in
    pub environment: Option<String>,
    pub enabled: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MaintenanceStatusResponse {
    pub success: bool,
    pub enabled: bool,
    pub message: String,
    pub environment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_per_environment() {
        let flags = MaintenanceFlags {
            production: true,
            ..MaintenanceFlags::default()
        };

        assert!(flags.get(AppEnvironment::Production));
        assert!(!flags.get(AppEnvironment::Preview));
        assert!(!flags.get(AppEnvironment::Development));
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let setting: Setting = serde_json::from_value(serde_json::json!({
            "key": "global",
            "maintenance": { "production": true }
        }))
        .unwrap();

        assert!(setting.maintenance.production);
        assert!(!setting.maintenance.development);
        assert_eq!(setting.message, DEFAULT_MAINTENANCE_MESSAGE);
    }
}
