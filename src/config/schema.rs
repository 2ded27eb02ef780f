//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every section defaults so a minimal (or absent) config still runs.

use serde::{Deserialize, Serialize};

/// Root configuration for the balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (bind address, connection ceiling).
    pub listener: ListenerConfig,

    /// Backends registered at startup. The control API can add and
    /// remove backends afterwards.
    pub backends: Vec<BackendSeedConfig>,

    /// Scheduling strategy active at startup.
    pub strategy: StrategyConfig,

    /// Health probing settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// A backend registered at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSeedConfig {
    /// Base URL requests are forwarded to (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Weight for weighted scheduling (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// Initial scheduling strategy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// One of "round_robin", "weighted", "least_conn".
    pub algorithm: String,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            algorithm: "round_robin".to_string(),
        }
    }
}

/// Health probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the periodic prober.
    pub enabled: bool,

    /// Seconds between probe rounds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            timeout_secs: 2,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// End-to-end request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose a Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the metrics exporter.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
