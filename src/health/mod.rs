//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs)
//!     → snapshot registered backends
//!     → probe all of them concurrently, each with its own timeout
//!     → write healthy/unhealthy back through the pool
//!       (no-op for backends removed mid-probe)
//!
//! Shutdown signal
//!     → cancels the pending tick and any in-flight probe round
//! ```
//!
//! # Design Decisions
//! - A slow or dead backend only times out its own probe; the rest of
//!   the round proceeds unaffected
//! - Probe failures never propagate as errors; they only flip the flag
//! - A response below 500 counts as alive — the probe asks "is anything
//!   answering", not "is this endpoint correct"

pub mod active;

pub use active::HealthProber;
