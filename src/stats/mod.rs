//! Request-distribution statistics subsystem.
//!
//! # Data Flow
//! ```text
//! pool select() succeeds
//!     → aggregator.rs append (address, timestamp), in selection order
//!     → rolling trim of records older than the 24h retention bound
//!
//! GET /_control/stats
//!     → pool.stats(periods)
//!     → aggregator.rs windowed counts per backend per period
//! ```
//!
//! # Design Decisions
//! - Append-only log; derived counts are computed per query, never cached
//! - Retention equals the largest named window (24h), so memory stays
//!   bounded and the `all` period covers retained history only
//! - Registered backends with no traffic still report 0 in every period

pub mod aggregator;

pub use aggregator::{Period, StatsAggregator};
