use crate::{
    config::AppEnvironment,
    database::{MongoDB, SETTINGS},
    models::{Setting, GLOBAL_SETTINGS_KEY},
    utils::AppError,
};
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use std::sync::{Arc, RwLock};

/// What the maintenance guard needs to know about the current environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceSnapshot {
    pub enabled: bool,
    pub message: String,
}

/// In-process cache of the maintenance flag for this deployment.
/// Refreshed by the poller and right after admin updates.
#[derive(Clone)]
pub struct MaintenanceState {
    environment: AppEnvironment,
    inner: Arc<RwLock<MaintenanceSnapshot>>,
}

impl MaintenanceState {
    pub fn new(environment: AppEnvironment) -> Self {
        Self {
            environment,
            inner: Arc::new(RwLock::new(MaintenanceSnapshot {
                enabled: false,
                message: crate::models::DEFAULT_MAINTENANCE_MESSAGE.to_string(),
            })),
        }
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn snapshot(&self) -> MaintenanceSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            // A poisoned lock only means a writer panicked; the value is still usable
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies the global settings document; returns true when the flag flipped
    pub fn apply(&self, setting: &Setting) -> bool {
        let next = MaintenanceSnapshot {
            enabled: setting.maintenance.get(self.environment),
            message: setting.message.clone(),
        };

        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let flipped = guard.enabled != next.enabled;
        *guard = next;
        flipped
    }
}

/// Loads the global settings document (defaults when it does not exist yet)
pub async fn load_settings(db: &MongoDB) -> Result<Setting, AppError> {
    let setting = db
        .collection::<Setting>(SETTINGS)
        .find_one(doc! { "key": GLOBAL_SETTINGS_KEY })
        .await?;

    Ok(setting.unwrap_or_default())
}

pub async fn update_maintenance(
    db: &MongoDB,
    environment: AppEnvironment,
    enabled: bool,
    message: Option<&str>,
    updated_by: &str,
) -> Result<Setting, AppError> {
    let field = format!("maintenance.{}", environment.as_str());

    let mut set_doc = doc! {
        "updated_at": chrono::Utc::now().timestamp(),
        "updated_by": updated_by,
    };
    set_doc.insert(field, enabled);

    if let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) {
        set_doc.insert("message", message);
    }

    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    db.collection::<Setting>(SETTINGS)
        .find_one_and_update(doc! { "key": GLOBAL_SETTINGS_KEY }, doc! { "$set": set_doc })
        .with_options(options)
        .await?
        .ok_or_else(|| AppError::DatabaseError("Settings upsert returned no document".to_string()))
}

/// Re-reads the settings and updates the cache. A failed read keeps the last value.
pub async fn refresh_maintenance(db: &MongoDB, state: &MaintenanceState) {
    match load_settings(db).await {
        Ok(setting) => {
            if state.apply(&setting) {
                let snapshot = state.snapshot();
                log::warn!(
                    "🛠️  Maintenance mode {} for {}",
                    if snapshot.enabled { "ENABLED" } else { "DISABLED" },
                    state.environment()
                );
            }
        }
        Err(e) => {
            log::warn!("⚠️  Maintenance poll failed, keeping last state: {}", e);
        }
    }
}
