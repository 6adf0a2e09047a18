//! Constants for the Roster API
//!
//! Defaults for every environment-driven setting live here.

// ============================================================================
// CACHE REFRESH
// ============================================================================

/// Default interval between cache refreshes in seconds
pub const DEFAULT_REVALIDATE_INTERVAL_SECS: u64 = 5;

// ============================================================================
// STORE
// ============================================================================

/// Default per-call timeout for store operations in seconds
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

/// Default timeout for the startup connection check in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default maximum number of pooled store connections
pub const DEFAULT_POOL_SIZE: usize = 16;

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;
