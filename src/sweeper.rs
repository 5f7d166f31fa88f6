//! Background expiry sweep.
//!
//! Pulls evict lazily, but if no consumer polls, expired records would linger
//! in the status view. The sweeper evicts on a fixed cadence shorter than the
//! TTL, so a record is visible for at most TTL + one interval.
//!
//! The sweep and the lazy eviction inside a pull apply the same `age >= TTL`
//! predicate under the same lock; a record removed by one is simply absent for
//! the other and is counted once.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::relay::JobRelay;

/// Default sweep interval (1 second).
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Spawns the sweeper on the current tokio runtime.
pub fn spawn_sweeper(
    relay: JobRelay,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_sweeper(relay, interval, shutdown))
}

/// Runs the sweep loop until `shutdown` is cancelled.
pub async fn run_sweeper(relay: JobRelay, interval: Duration, shutdown: CancellationToken) {
    info!(interval_ms = interval.as_millis() as u64, "Expiry sweeper started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown signal received, stopping sweeper");
                break;
            }

            _ = ticker.tick() => {
                let evicted = relay.sweep(Utc::now());
                if evicted > 0 {
                    debug!(
                        evicted,
                        queue_size = relay.queue_len(),
                        "Swept expired jobs"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{CategoryRanking, DedupePolicy};
    use crate::relay::QueueSettings;
    use crate::types::{Category, JobCandidate};

    fn relay(ttl: Duration) -> JobRelay {
        JobRelay::new(
            QueueSettings {
                ttl,
                dedupe: DedupePolicy::default(),
                ranking: CategoryRanking::default(),
            },
            Utc::now(),
        )
    }

    fn candidate(name: &str) -> JobCandidate {
        JobCandidate {
            name: name.to_string(),
            ..JobCandidate::default()
        }
    }

    #[tokio::test]
    async fn sweeper_evicts_without_pulls() {
        let relay = relay(Duration::from_millis(50));
        relay.admit(candidate("A"), Category::new("free"), Utc::now());

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(relay.clone(), Duration::from_millis(10), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(relay.queue_len(), 0);
        assert_eq!(relay.snapshot(Utc::now()).stats.total_expired, 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn sweeper_leaves_live_records() {
        let relay = relay(Duration::from_secs(60));
        relay.admit(candidate("A"), Category::new("free"), Utc::now());

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(relay.clone(), Duration::from_millis(10), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(relay.queue_len(), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(
            relay(Duration::from_secs(1)),
            Duration::from_millis(10),
            shutdown.clone(),
        );

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop promptly")
            .unwrap();
    }
}
