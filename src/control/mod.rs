//! Control-plane API subsystem.
//!
//! # Data Flow
//! ```text
//! POST /_control/add        → pool.add
//! POST /_control/remove     → pool.remove
//! POST /_control/scheduler  → pool.set_strategy
//! GET  /_control/list       → pool.list (registry-ordered snapshots)
//! GET  /_control/stats      → pool.stats (period → backend → count)
//! ```
//!
//! # Design Decisions
//! - Thin marshaling only: every handler is a JSON shim over one pool
//!   method
//! - Pool errors map to client-error statuses here, at the boundary;
//!   the pool itself stays HTTP-free

pub mod handlers;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::balancer::BalanceError;
use crate::http::server::AppState;
use self::handlers::*;

/// Routes mounted on the main listener, ahead of the proxy fallback.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/_control/add", post(add_backend))
        .route("/_control/remove", post(remove_backend))
        .route("/_control/scheduler", post(set_scheduler))
        .route("/_control/list", get(list_backends))
        .route("/_control/stats", get(get_stats))
}

impl IntoResponse for BalanceError {
    fn into_response(self) -> Response {
        let status = match self {
            BalanceError::DuplicateBackend(_) => StatusCode::CONFLICT,
            BalanceError::UnknownBackend(_) => StatusCode::NOT_FOUND,
            BalanceError::UnknownStrategy(_) => StatusCode::BAD_REQUEST,
            BalanceError::InvalidPeriod(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
