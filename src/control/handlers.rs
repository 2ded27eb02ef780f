//! Control-plane request handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::balancer::backend::{parse_backend_url, BackendSnapshot};
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct AddBackendRequest {
    pub url: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RemoveBackendRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SetSchedulerRequest {
    pub algorithm: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Comma-separated period names; absent means every period.
    pub periods: Option<String>,
}

pub async fn add_backend(
    State(state): State<AppState>,
    Json(body): Json<AddBackendRequest>,
) -> Response {
    let url = match parse_backend_url(&body.url) {
        Ok(url) => url,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("invalid backend url: {e}") })),
            )
                .into_response();
        }
    };

    match state.pool.add(url, body.weight) {
        Ok(()) => Json(serde_json::json!({ "status": "added" })).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn remove_backend(
    State(state): State<AppState>,
    Json(body): Json<RemoveBackendRequest>,
) -> Response {
    match state.pool.remove(&body.url) {
        Ok(()) => Json(serde_json::json!({ "status": "removed" })).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn set_scheduler(
    State(state): State<AppState>,
    Json(body): Json<SetSchedulerRequest>,
) -> Response {
    match state.pool.set_strategy(&body.algorithm) {
        Ok(()) => Json(serde_json::json!({ "status": "scheduler_updated" })).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_backends(State(state): State<AppState>) -> Json<Vec<BackendSnapshot>> {
    Json(state.pool.list())
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Response {
    let periods: Option<Vec<String>> = query.periods.map(|raw| {
        raw.split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    });

    match state.pool.stats(periods.as_deref()) {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => e.into_response(),
    }
}
