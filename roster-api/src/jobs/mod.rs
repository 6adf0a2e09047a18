//! Background Jobs for the Roster API
//!
//! - `refresh`: reloads the entity cache from the store on a fixed interval
//!
//! # Usage
//!
//! The refresher is warmed once and then spawned during server startup:
//!
//! ```ignore
//! use roster_api::jobs::{RefreshConfig, Refresher};
//! use tokio::sync::watch;
//!
//! let refresher = Refresher::new(store, Arc::clone(&cache), RefreshConfig::default());
//! refresher.warm().await;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let handle = refresher.spawn(shutdown_rx);
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! let metrics = handle.await?;
//! ```

pub mod refresh;

// Re-export commonly used types
pub use refresh::{
    RefreshConfig, RefreshMetrics, RefreshMetricsSnapshot, RefreshPhase, RefreshStatus,
    Refresher, TickOutcome,
};
