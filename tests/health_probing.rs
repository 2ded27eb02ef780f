//! Integration tests for the background health prober.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use steer::balancer::pool::BackendPool;
use steer::config::HealthCheckConfig;
use steer::health::HealthProber;
use steer::lifecycle::Shutdown;

mod common;

fn probe_config() -> HealthCheckConfig {
    HealthCheckConfig {
        enabled: true,
        interval_secs: 1,
        timeout_secs: 1,
    }
}

#[tokio::test]
async fn probes_flip_health_flags_both_ways() {
    let alive: SocketAddr = "127.0.0.1:28381".parse().unwrap();
    common::start_mock_backend(alive, "ok").await;

    let pool = Arc::new(BackendPool::new());
    pool.add(format!("http://{alive}/").parse().unwrap(), 1)
        .unwrap();
    // Nothing listens on this port; the probe must flip it unhealthy
    // without disturbing the reachable backend's probe.
    pool.add("http://127.0.0.1:28382/".parse().unwrap(), 1)
        .unwrap();

    let prober = HealthProber::new(pool.clone(), probe_config());
    prober.probe_round().await;

    let listed = pool.list();
    assert!(listed[0].healthy, "reachable backend marked unhealthy");
    assert!(!listed[1].healthy, "unreachable backend marked healthy");
}

#[tokio::test]
async fn prober_recovers_backends_that_come_back() {
    let addr: SocketAddr = "127.0.0.1:28383".parse().unwrap();

    let pool = Arc::new(BackendPool::new());
    pool.add(format!("http://{addr}/").parse().unwrap(), 1)
        .unwrap();

    let prober = HealthProber::new(pool.clone(), probe_config());
    prober.probe_round().await;
    assert!(!pool.list()[0].healthy);

    common::start_mock_backend(addr, "back").await;
    prober.probe_round().await;
    assert!(pool.list()[0].healthy);
}

#[tokio::test]
async fn background_prober_runs_and_stops_cleanly() {
    let addr: SocketAddr = "127.0.0.1:28384".parse().unwrap();

    let pool = Arc::new(BackendPool::new());
    pool.add(format!("http://{addr}/").parse().unwrap(), 1)
        .unwrap();

    let shutdown = Shutdown::new();
    let prober = HealthProber::new(pool.clone(), probe_config());
    let handle = tokio::spawn(prober.run(shutdown.subscribe()));

    // The first tick fires immediately; give the round time to land.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!pool.list()[0].healthy);

    // Shutdown cancels the pending tick; the task must exit promptly.
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("prober did not observe shutdown")
        .unwrap();
}
