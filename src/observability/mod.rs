//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     logging.rs → tracing subscriber with env-filter
//!     metrics.rs → Prometheus exporter on its own listener
//!
//! Runtime:
//!     proxy handler / pool / prober → metrics.rs record_* helpers
//!     every subsystem → tracing macros (structured fields)
//! ```
//!
//! # Design Decisions
//! - Metric updates are fire-and-forget macro calls; no handler ever
//!   blocks on the exporter
//! - Labels carry backend address, strategy, and status code
//! - Log filter comes from RUST_LOG with a crate-level default

pub mod logging;
pub mod metrics;
