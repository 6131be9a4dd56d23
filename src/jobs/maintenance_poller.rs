// ==================== MAINTENANCE POLLER ====================
// Keeps the in-process maintenance flag in sync with the settings
// collection, so every instance picks up admin changes within one period.

use crate::{
    database::MongoDB,
    services::settings_service::{self, MaintenanceState},
};
use tokio::time::{interval, Duration};

pub async fn start_maintenance_poller(db: MongoDB, state: MaintenanceState, period: Duration) {
    // Load once before serving traffic
    settings_service::refresh_maintenance(&db, &state).await;

    let snapshot = state.snapshot();
    log::info!(
        "🛠️  Maintenance mode for {}: {} (polling every {}s)",
        state.environment(),
        if snapshot.enabled { "ON" } else { "off" },
        period.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = interval(period);
        // First tick fires immediately and the state was just loaded
        ticker.tick().await;

        loop {
            ticker.tick().await;
            settings_service::refresh_maintenance(&db, &state).await;
        }
    });
}
