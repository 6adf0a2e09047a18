//! Service Configuration Module
//!
//! Configuration is read once at startup from environment variables. The
//! store URI is mandatory; everything else has a default from
//! [`constants`](crate::constants). Any invalid value is fatal.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use roster_core::ConfigError;

use crate::constants::{
    DEFAULT_BIND_HOST, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_POOL_SIZE, DEFAULT_PORT,
    DEFAULT_REVALIDATE_INTERVAL_SECS, DEFAULT_STORE_TIMEOUT_SECS,
};
use crate::jobs::RefreshConfig;

/// Environment variable holding the PostgreSQL connection URI.
pub const STORE_URI_VAR: &str = "ROSTER_STORE_URI";

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Parsed store connection settings. `Debug` redacts the password.
    pub store: tokio_postgres::Config,

    /// How often the refresher reloads the cache. Upper bound on staleness.
    pub revalidate_interval: Duration,

    /// Per-call bound on store operations.
    pub store_timeout: Duration,

    /// Bound on the startup connectivity check.
    pub connect_timeout: Duration,

    /// Maximum pooled store connections.
    pub pool_size: usize,

    pub bind_host: String,
    pub port: u16,
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_STORE_URI`: PostgreSQL URI (required)
    /// - `ROSTER_REVALIDATE_INTERVAL_SECS`: Cache refresh interval (default: 5)
    /// - `ROSTER_STORE_TIMEOUT_SECS`: Per-call store timeout (default: 5)
    /// - `ROSTER_CONNECT_TIMEOUT_SECS`: Startup connection timeout (default: 10)
    /// - `ROSTER_POOL_SIZE`: Max pooled connections (default: 16)
    /// - `ROSTER_API_BIND`: Listen host (default: 0.0.0.0)
    /// - `PORT` or `ROSTER_API_PORT`: Listen port (default: 3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup(STORE_URI_VAR)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::missing(STORE_URI_VAR))?;
        let store = uri
            .trim()
            .parse::<tokio_postgres::Config>()
            .map_err(|e| ConfigError::invalid(STORE_URI_VAR, "<redacted>", e.to_string()))?;

        let revalidate_interval = secs(
            &lookup,
            "ROSTER_REVALIDATE_INTERVAL_SECS",
            DEFAULT_REVALIDATE_INTERVAL_SECS,
        )?;
        let store_timeout = secs(&lookup, "ROSTER_STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS)?;
        let connect_timeout = secs(
            &lookup,
            "ROSTER_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        let pool_size = parsed(&lookup, "ROSTER_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(ConfigError::invalid("ROSTER_POOL_SIZE", "0", "must be positive"));
        }

        let bind_host = lookup("ROSTER_API_BIND").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());
        let port = match lookup("PORT") {
            Some(_) => parsed(&lookup, "PORT", DEFAULT_PORT)?,
            None => parsed(&lookup, "ROSTER_API_PORT", DEFAULT_PORT)?,
        };

        Ok(Self {
            store,
            revalidate_interval,
            store_timeout,
            connect_timeout,
            pool_size,
            bind_host,
            port,
        })
    }

    /// Socket address the HTTP server binds to.
    ///
    /// `ROSTER_API_BIND` must be an IP literal, IPv4 or IPv6 (`::`, no
    /// brackets). Hostnames such as `localhost` are rejected.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.bind_host.trim();
        let ip = host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::invalid("ROSTER_API_BIND", host, e.to_string()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Refresher settings derived from this configuration.
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            revalidate_interval: self.revalidate_interval,
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn secs<F>(lookup: &F, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parsed(lookup, key, default)?;
    if value == 0 {
        return Err(ConfigError::invalid(key, "0", "must be at least one second"));
    }
    Ok(Duration::from_secs(value))
}
