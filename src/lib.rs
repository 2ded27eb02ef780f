//! steer — a reverse-proxy load balancer.
//!
//! Distributes inbound requests across a dynamic backend set using an
//! interchangeable scheduling strategy (round robin, weighted round
//! robin, least connections), probes backend liveness in the background,
//! and tracks request distribution over sliding windows.

// Core subsystems
pub mod balancer;
pub mod health;
pub mod stats;

// Surfaces
pub mod config;
pub mod control;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use balancer::pool::BackendPool;
pub use balancer::{BalanceError, StrategyKind};
pub use config::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
