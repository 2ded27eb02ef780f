//! Active health probing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use futures_util::future::join_all;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::sync::broadcast;
use tokio::time;
use url::Url;

use crate::balancer::pool::BackendPool;
use crate::config::HealthCheckConfig;
use crate::observability::metrics;

/// Periodic liveness prober for every registered backend.
pub struct HealthProber {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthProber {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            pool,
            config,
            client,
        }
    }

    /// Run until the shutdown signal fires.
    ///
    /// Shutdown cancels the pending tick and drops any probe round still
    /// in flight; the spawner awaits this future's JoinHandle, so no
    /// probe outlives the pool.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            "Health prober starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.probe_round() => {}
                        _ = shutdown.recv() => break,
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
        tracing::info!("Health prober stopped");
    }

    /// Probe every registered backend concurrently and reconcile.
    ///
    /// The registry may change while probes are awaited; `set_health`
    /// ignores backends that are gone by the time their probe lands.
    pub async fn probe_round(&self) {
        let targets = self.pool.addresses();
        let results = join_all(targets.iter().map(|url| self.probe_one(url))).await;

        for (url, healthy) in targets.iter().zip(results) {
            self.pool.set_health(url.as_str(), healthy);
        }
    }

    /// One liveness probe: HEAD to the backend's base URL.
    ///
    /// Any reply below 500 means something is alive there; connection
    /// errors, 5xx, and timeouts all count as down. Failures never leave
    /// this function as errors.
    async fn probe_one(&self, url: &Url) -> bool {
        let started = Instant::now();

        let request = match Request::builder()
            .method("HEAD")
            .uri(url.as_str())
            .header("user-agent", "steer-health-probe")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %url, error = %e, "Failed to build probe request");
                return false;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let healthy = match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let alive = response.status().as_u16() < 500;
                if !alive {
                    tracing::warn!(backend = %url, status = %response.status(), "Probe failed: server error status");
                }
                alive
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %url, error = %e, "Probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %url, "Probe failed: timeout");
                false
            }
        };

        metrics::record_backend_health(url.as_str(), healthy, started);
        tracing::debug!(backend = %url, healthy, "Probe finished");
        healthy
    }
}
