//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router: control routes plus a catch-all proxy
//! - Wire up middleware (tracing, timeout, request ID)
//! - Spawn and tear down the health prober around the accept loop
//! - Forward requests to the backend the pool selects

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::uri::{Authority, PathAndQuery, Scheme},
    http::{HeaderName, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::balancer::backend::Backend;
use crate::balancer::pool::BackendPool;
use crate::config::BalancerConfig;
use crate::control;
use crate::health::HealthProber;
use crate::http::request::{MakeUuidRequestId, X_REQUEST_ID};
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub client: Client<HttpConnector, Body>,
}

/// The balancer's HTTP front end: control API plus proxying.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    pub fn new(config: BalancerConfig, pool: Arc<BackendPool>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = AppState {
            pool: pool.clone(),
            client,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &BalancerConfig, state: AppState) -> Router {
        let request_id_header = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .merge(control::router())
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
            .layer(SetRequestIdLayer::new(request_id_header, MakeUuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// The health prober starts before the accept loop and is awaited
    /// after it drains, so probes never touch a torn-down pool.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let prober_handle = if self.config.health_check.enabled {
            let prober = HealthProber::new(self.pool.clone(), self.config.health_check.clone());
            let rx = shutdown.subscribe();
            Some(tokio::spawn(prober.run(rx)))
        } else {
            tracing::info!("Health probing disabled");
            None
        };

        let mut external_shutdown = shutdown.subscribe();
        let graceful = async move {
            tokio::select! {
                _ = shutdown_signal() => {}
                _ = external_shutdown.recv() => {}
            }
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(graceful)
            .await?;

        shutdown.trigger();
        if let Some(handle) = prober_handle {
            let _ = handle.await;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum ForwardError {
    #[error("failed to rewrite request URI: {0}")]
    Uri(#[from] axum::http::uri::InvalidUriParts),

    #[error("backend URL has no valid authority: {0}")]
    Authority(#[from] axum::http::uri::InvalidUri),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Catch-all proxy handler: select a backend, forward, release.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // The guard releases the selection when it drops. The timeout layer
    // and client disconnects cancel this future mid-forward, so the
    // release must not depend on reaching any line below the await.
    let Some(backend) = state.pool.select_guarded() else {
        tracing::warn!(request_id = %request_id, "No backends registered");
        return (StatusCode::SERVICE_UNAVAILABLE, "no backends available").into_response();
    };
    let address = backend.address().to_string();
    tracing::debug!(
        request_id = %request_id,
        backend = %address,
        path = %request.uri().path(),
        "Forwarding request"
    );

    let result = forward(&state.client, &backend, request).await;

    match result {
        Ok(response) => {
            metrics::record_request(&address, response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, backend = %address, error = %e, "Upstream error");
            metrics::record_request(&address, StatusCode::BAD_GATEWAY.as_u16(), start);
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

/// Rewrite the request URI onto the backend and forward it.
async fn forward(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    request: Request<Body>,
) -> Result<Response, ForwardError> {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(backend_authority(backend)?);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = Uri::from_parts(uri_parts)?;
    // The client derives Host from the rewritten authority.
    parts.headers.remove(axum::http::header::HOST);

    let response = client.request(Request::from_parts(parts, body)).await?;
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}

fn backend_authority(backend: &Backend) -> Result<Authority, ForwardError> {
    // Registration only admits http URLs, which always carry a host; an
    // empty host here fails the authority parse rather than being
    // papered over.
    let host = backend.url.host_str().unwrap_or_default();
    let rendered = match backend.url.port_or_known_default() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Ok(Authority::from_str(&rendered)?)
}
