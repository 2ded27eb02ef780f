//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Seed pool → Start prober → Bind listener
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs)
//!     → axum stops accepting and drains connections
//!     → shutdown.rs broadcast fires
//!     → health prober observes cancellation, JoinHandle awaited
//! ```
//!
//! # Design Decisions
//! - Listeners start last: traffic only once the pool and prober exist
//! - The prober is awaited after the server exits, so no probe ever
//!   runs against a torn-down pool

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
