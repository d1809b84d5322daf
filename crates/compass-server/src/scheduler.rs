//! Periodic digest sweeps.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use compass_digest::DigestPipeline;

/// Run a sweep every `period` until `shutdown` is cancelled.  The first sweep
/// happens one full period after startup.
pub fn spawn_sweep_scheduler(
    pipeline: DigestPipeline,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = period.as_secs(), "digest scheduler started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            match pipeline.run_sweep(&shutdown).await {
                Ok(report) => info!(
                    sent = report.sent,
                    failed = report.failed,
                    cancelled = report.cancelled,
                    "scheduled sweep complete"
                ),
                Err(e) => error!(error = %e, "scheduled sweep could not enumerate relationships"),
            }
        }

        info!("digest scheduler stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use compass_digest::{DigestConfig, LogTransport};
    use compass_shared::SharedField;
    use compass_store::{Database, PartnerShare, SharedDatabase, User};
    use uuid::Uuid;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_on_each_period_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("sched.db")).unwrap();
        let partner = Uuid::new_v4();
        db.insert_user(&User {
            id: partner,
            email: Some("p@example.com".into()),
            role: "partner".into(),
            partner_id: None,
            created_at: Utc::now(),
        })
        .unwrap();
        db.insert_partner_share(&PartnerShare {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            partner_id: partner,
            consent: true,
            shared_fields: vec![SharedField::MoodTrend],
            last_shared: None,
        })
        .unwrap();

        let shared = SharedDatabase::new(db);
        let pipeline = DigestPipeline::new(shared.clone(), Arc::new(LogTransport), DigestConfig::default());
        let shutdown = CancellationToken::new();
        let handle = spawn_sweep_scheduler(pipeline, Duration::from_secs(60), shutdown.clone());

        // Nothing before the first period elapses.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(shared.call(|db| db.count_digest_records()).await.unwrap(), 0);

        let mut count = 0;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            count = shared.call(|db| db.count_digest_records()).await.unwrap();
            if count > 0 {
                break;
            }
        }
        assert!(count >= 1);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
