// ==================== INGESTION SCHEDULER ====================
// Background job that pulls hiring posts from the search sources and
// upserts them into the jobs collection.
//
// Config via env:
//   INGESTION_ENABLED        "true" to run (default: true)
//   INGESTION_INTERVAL_SECS  loop period (default: 6h, min 60s)
//   INGESTION_DELAY_MS       pause between categories (default: 2s)

use crate::{database::MongoDB, services::ingestion_service::Ingestor, utils::AppError};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Delay before the first run so the server finishes booting
const WARMUP_SECS: u64 = 30;

pub async fn start_ingestion_scheduler(db: MongoDB, ingestor: Arc<Ingestor>, period: Duration, enabled: bool) {
    if !enabled {
        log::info!("⏸️  Ingestion scheduler DISABLED (INGESTION_ENABLED)");
        return;
    }

    log::info!(
        "📥 Starting ingestion scheduler (every {}s, first run in {}s)",
        period.as_secs(),
        WARMUP_SECS
    );

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(WARMUP_SECS)).await;

        let mut ticker = interval(period);
        // A slow run must not trigger a burst of catch-up runs
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match ingestor.run(&db).await {
                Ok(report) => {
                    log::info!(
                        "✅ Scheduled ingestion done: {} new, {} updated, {} alerts",
                        report.inserted,
                        report.updated,
                        report.alerts_sent
                    );
                }
                Err(AppError::ServiceUnavailable(msg)) => {
                    log::info!("⏭️  Scheduled ingestion skipped: {}", msg);
                }
                Err(e) => {
                    log::error!("❌ Scheduled ingestion failed: {}", e);
                }
            }
        }
    });

    log::info!("✅ Ingestion scheduler started successfully");
}
