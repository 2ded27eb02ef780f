//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use steer::balancer::pool::BackendPool;
use steer::config::BalancerConfig;
use steer::http::HttpServer;
use steer::lifecycle::Shutdown;

/// Start a simple mock backend that answers every request with a fixed
/// 200 body (HEAD probes included).
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a backend that accepts connections but never answers, for
/// exercising the request timeout path.
pub async fn start_stalled_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        let mut open = Vec::new();
        loop {
            match listener.accept().await {
                // Hold the socket so the peer keeps waiting for a
                // response instead of seeing a reset.
                Ok((socket, _)) => open.push(socket),
                Err(_) => break,
            }
        }
    });
}

/// Spawn a balancer on `addr` and wait until it accepts connections.
/// Returns the shared pool, a shutdown handle, and the server task.
pub async fn start_balancer(
    addr: SocketAddr,
    config: BalancerConfig,
) -> (Arc<BackendPool>, Shutdown, tokio::task::JoinHandle<()>) {
    let pool = Arc::new(BackendPool::new());
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind(addr).await.unwrap();
    let server = HttpServer::new(config, pool.clone());
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    wait_until_ready(addr).await;
    (pool, shutdown, handle)
}

/// Poll until something is accepting on `addr`.
pub async fn wait_until_ready(addr: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {addr} never became ready");
}

/// A config with probing disabled, for tests that manage health flags
/// themselves.
pub fn quiet_config() -> BalancerConfig {
    let mut config = BalancerConfig::default();
    config.health_check.enabled = false;
    config
}
