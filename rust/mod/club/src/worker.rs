use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::service::ClubService;

/// Configuration for the background reconcile loop.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Seconds between follower-count reconciliation passes. 0 disables the loop.
    pub reconcile_interval: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: 300,
        }
    }
}

/// Start the follower-count reconcile loop.
///
/// Returns a CancellationToken that stops the worker when cancelled.
pub fn start(svc: Arc<ClubService>, config: WorkerConfig) -> CancellationToken {
    let cancel = CancellationToken::new();

    if config.reconcile_interval == 0 {
        info!("reconcile worker disabled");
        return cancel;
    }

    let token = cancel.clone();
    let interval = Duration::from_secs(config.reconcile_interval);

    tokio::spawn(async move {
        info!("reconcile worker started (interval={interval:?})");
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("reconcile worker stopped");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    debug!("reconcile scan");
                    let svc = Arc::clone(&svc);
                    match tokio::task::spawn_blocking(move || svc.reconcile_followers()).await {
                        Ok(Ok(report)) if report.clubs_repaired > 0 => {
                            info!("reconcile worker: repaired {} clubs", report.clubs_repaired)
                        }
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => error!("reconcile worker error: {e}"),
                        Err(e) => error!("reconcile worker panicked: {e}"),
                    }
                }
            }
        }
    });

    cancel
}

#[cfg(test)]
mod tests {
    use clubhub_kv::KVStore;

    use super::*;
    use crate::service::keys;
    use crate::service::testutil::*;

    #[tokio::test]
    async fn test_worker_repairs_and_stops() {
        let (svc, _dir) = test_service();
        let hana = head(&svc, "Hana");
        let club = club_headed_by(&svc, &hana, "Chess");
        let mut raw = svc.get_club(&club.id).unwrap();
        raw.followers_count = 4;
        svc.kv
            .set(&keys::club(&club.id), &serde_json::to_vec(&raw).unwrap())
            .unwrap();

        let cancel = start(
            Arc::clone(&svc),
            WorkerConfig {
                reconcile_interval: 1,
            },
        );

        let mut repaired = false;
        for _ in 0..30 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if svc.get_club(&club.id).unwrap().followers_count == 0 {
                repaired = true;
                break;
            }
        }
        cancel.cancel();
        assert!(repaired);
    }

    #[tokio::test]
    async fn test_zero_interval_disables_worker() {
        let (svc, _dir) = test_service();
        let cancel = start(svc, WorkerConfig { reconcile_interval: 0 });
        assert!(!cancel.is_cancelled());
    }
}
