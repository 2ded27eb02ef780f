//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → request.rs (attach x-request-id)
//!     → /_control/* → control layer
//!     → everything else → proxy handler
//!         → pool.select_guarded() → forward to backend
//!         → release on guard drop (also covers cancelled requests)
//! ```

pub mod request;
pub mod server;

pub use request::{MakeUuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
