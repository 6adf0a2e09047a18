//! Cache Refresh Background Task
//!
//! The refresher is the only writer of the [`EntityCache`]. On every tick it
//! pulls the full entity set through the store gateway and swaps it into the
//! cache. A failed fetch is logged and leaves the cache as it was; the next
//! scheduled tick simply tries again.
//!
//! ```text
//!   Idle --tick--> Fetching --ok--> replace cache --> Idle
//!                      |
//!                      +--err--> log, keep cache --> Idle
//!
//!   any --shutdown--> Stopped
//! ```
//!
//! Worst-case staleness of a read equals `revalidate_interval` plus the
//! duration of one fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use roster_storage::{EntityCache, EntityStore};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::constants::DEFAULT_REVALIDATE_INTERVAL_SECS;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Time between two scheduled fetches (default: 5 seconds)
    pub revalidate_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            revalidate_interval: Duration::from_secs(DEFAULT_REVALIDATE_INTERVAL_SECS),
        }
    }
}

// ============================================================================
// PHASE AND OUTCOME
// ============================================================================

/// What the refresher is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    /// Waiting for the next tick.
    Idle,
    /// A `fetch_all` is in flight.
    Fetching,
    /// The task has exited.
    Stopped,
}

/// Result of a single refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A fresh snapshot with this many entities is now being served.
    Installed { entities: usize },
    /// The store call failed; the cache was left untouched.
    FetchFailed,
}

impl TickOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, TickOutcome::Installed { .. })
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for refresh activity since startup.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    /// Refresh attempts, including the cold-start fetch
    pub ticks: AtomicU64,

    /// Attempts that installed a new snapshot
    pub installs: AtomicU64,

    /// Attempts whose fetch failed
    pub failures: AtomicU64,
}

impl RefreshMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> RefreshMetricsSnapshot {
        RefreshMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            installs: self.installs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of refresh metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshMetricsSnapshot {
    pub ticks: u64,
    pub installs: u64,
    pub failures: u64,
}

/// Read-only view of a refresher, handed to the HTTP layer.
#[derive(Debug, Clone)]
pub struct RefreshStatus {
    phase: watch::Receiver<RefreshPhase>,
    metrics: Arc<RefreshMetrics>,
}

impl RefreshStatus {
    pub fn phase(&self) -> RefreshPhase {
        *self.phase.borrow()
    }

    pub fn metrics(&self) -> RefreshMetricsSnapshot {
        self.metrics.snapshot()
    }
}

// ============================================================================
// REFRESHER
// ============================================================================

/// Periodically replaces the cache contents with a fresh store snapshot.
pub struct Refresher {
    store: Arc<dyn EntityStore>,
    cache: Arc<EntityCache>,
    config: RefreshConfig,
    metrics: Arc<RefreshMetrics>,
    phase_tx: watch::Sender<RefreshPhase>,
}

impl Refresher {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: Arc<EntityCache>,
        config: RefreshConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(RefreshPhase::Idle);
        Self {
            store,
            cache,
            config,
            metrics: Arc::new(RefreshMetrics::new()),
            phase_tx,
        }
    }

    /// Observer handle that stays valid after the task has been spawned.
    pub fn status(&self) -> RefreshStatus {
        RefreshStatus {
            phase: self.phase_tx.subscribe(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Best-effort cold-start fetch.
    ///
    /// On failure the cache keeps serving the empty snapshot until the first
    /// successful tick.
    pub async fn warm(&self) -> TickOutcome {
        let outcome = self.tick().await;
        match outcome {
            TickOutcome::Installed { entities } => {
                tracing::info!(entities, "Entity cache warmed");
            }
            TickOutcome::FetchFailed => {
                tracing::warn!(
                    "Cold-start fetch failed, serving an empty cache until the next tick"
                );
            }
        }
        outcome
    }

    /// Perform one refresh attempt.
    ///
    /// Never fails: store errors are logged and counted, and the cache is left
    /// exactly as it was.
    pub async fn tick(&self) -> TickOutcome {
        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);
        self.phase_tx.send_replace(RefreshPhase::Fetching);

        let outcome = match self.store.fetch_all().await {
            Ok(snapshot) => {
                let entities = snapshot.len();
                self.cache.replace(snapshot);
                self.metrics.installs.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(entities, "Installed fresh entity snapshot");
                TickOutcome::Installed { entities }
            }
            Err(e) => {
                self.metrics.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Entity refresh failed, keeping previous snapshot");
                TickOutcome::FetchFailed
            }
        };

        self.phase_tx.send_replace(RefreshPhase::Idle);
        outcome
    }

    /// Run the refresh loop until shutdown is requested.
    ///
    /// The first scheduled tick fires one full interval after the call.
    /// The loop exits when `shutdown_rx` flips to `true` or its sender is
    /// dropped.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Arc<RefreshMetrics> {
        let period = self.config.revalidate_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            revalidate_interval_ms = period.as_millis() as u64,
            "Cache refresher started"
        );

        if !*shutdown_rx.borrow_and_update() {
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            tracing::info!("Shutdown sender dropped, cache refresher stopping");
                            break;
                        }
                        if *shutdown_rx.borrow() {
                            tracing::info!("Cache refresher shutting down");
                            break;
                        }
                    }

                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }
        }

        self.phase_tx.send_replace(RefreshPhase::Stopped);

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            ticks = snapshot.ticks,
            installs = snapshot.installs,
            failures = snapshot.failures,
            "Cache refresher completed"
        );

        self.metrics
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<Arc<RefreshMetrics>> {
        tokio::spawn(self.run(shutdown_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::{new_entity_id, Entity, NewEntity};
    use roster_storage::InMemoryEntityStore;

    const PERIOD: Duration = Duration::from_secs(5);

    fn setup(store: Arc<InMemoryEntityStore>) -> (Refresher, Arc<EntityCache>) {
        let cache = Arc::new(EntityCache::new());
        let refresher = Refresher::new(
            store,
            Arc::clone(&cache),
            RefreshConfig {
                revalidate_interval: PERIOD,
            },
        );
        (refresher, cache)
    }

    #[tokio::test]
    async fn test_tick_installs_snapshot() {
        let seeded = vec![
            Entity::new(new_entity_id(), "a"),
            Entity::new(new_entity_id(), "b"),
        ];
        let store = Arc::new(InMemoryEntityStore::with_entities(seeded.clone()));
        let (refresher, cache) = setup(store);

        assert_eq!(refresher.tick().await, TickOutcome::Installed { entities: 2 });
        assert_eq!(cache.read().entities(), seeded.as_slice());
        assert_eq!(refresher.status().phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_tick_keeps_previous_snapshot() {
        let store = Arc::new(InMemoryEntityStore::with_entities(vec![Entity::new(
            new_entity_id(),
            "kept",
        )]));
        let (refresher, cache) = setup(Arc::clone(&store));

        refresher.tick().await;
        let before = cache.read();

        store.set_offline(true);
        assert_eq!(refresher.tick().await, TickOutcome::FetchFailed);
        assert!(Arc::ptr_eq(&before, &cache.read()));

        store.set_offline(false);
        assert!(store.insert_one(NewEntity::new("added")).await.is_ok());
        assert_eq!(refresher.tick().await, TickOutcome::Installed { entities: 2 });

        let metrics = refresher.status().metrics();
        assert_eq!(
            metrics,
            RefreshMetricsSnapshot {
                ticks: 3,
                installs: 2,
                failures: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_cold_start_failure_serves_empty_then_fills() {
        let store = Arc::new(InMemoryEntityStore::with_entities(vec![Entity::new(
            new_entity_id(),
            "late",
        )]));
        store.set_offline(true);
        let (refresher, cache) = setup(Arc::clone(&store));

        assert_eq!(refresher.warm().await, TickOutcome::FetchFailed);
        assert!(cache.is_empty());

        store.set_offline(false);
        assert!(refresher.tick().await.is_installed());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let store = Arc::new(InMemoryEntityStore::new());
        let (refresher, _cache) = setup(store);
        let status = refresher.status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = refresher.spawn(shutdown_rx);

        tokio::time::sleep(PERIOD / 2).await;
        assert_eq!(status.metrics().ticks, 0);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(status.metrics().ticks, 1);

        let _ = shutdown_tx.send(true);
        assert!(handle.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_visible_within_one_interval() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(InMemoryEntityStore::new());
        let (refresher, cache) = setup(Arc::clone(&store));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = refresher.spawn(shutdown_rx);

        let inserted = store.insert_one(NewEntity::new("fresh")).await?;
        assert!(cache.read().find(inserted.id).is_none());

        tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        assert_eq!(cache.read().find(inserted.id), Some(&inserted));

        let _ = shutdown_tx.send(true);
        handle.await?;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(InMemoryEntityStore::new());
        store.set_offline(true);
        let (refresher, cache) = setup(Arc::clone(&store));
        let status = refresher.status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = refresher.spawn(shutdown_rx);

        // Failures on every tick must not end the task.
        tokio::time::sleep(PERIOD * 3 + Duration::from_millis(10)).await;
        assert!(!handle.is_finished());
        assert!(cache.is_empty());

        shutdown_tx.send(true)?;
        let metrics = handle.await?.snapshot();

        assert_eq!(metrics.ticks, 3);
        assert_eq!(metrics.failures, 3);
        assert_eq!(status.phase(), RefreshPhase::Stopped);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_stops_loop() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(InMemoryEntityStore::new());
        let (refresher, _cache) = setup(store);
        let status = refresher.status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = refresher.spawn(shutdown_rx);

        drop(shutdown_tx);
        handle.await?;

        assert_eq!(status.phase(), RefreshPhase::Stopped);
        Ok(())
    }

    #[tokio::test]
    async fn test_already_signalled_shutdown_exits_immediately() {
        let store = Arc::new(InMemoryEntityStore::new());
        let (refresher, _cache) = setup(store);
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        let metrics = refresher.run(shutdown_rx).await;
        assert_eq!(metrics.snapshot().ticks, 0);
    }
}
