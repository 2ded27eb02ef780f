//! End-to-end tests for the control API and proxying.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn proxies_to_registered_backends_and_reports_stats() {
    let backend_a: SocketAddr = "127.0.0.1:28281".parse().unwrap();
    let backend_b: SocketAddr = "127.0.0.1:28282".parse().unwrap();
    let balancer: SocketAddr = "127.0.0.1:28283".parse().unwrap();

    common::start_mock_backend(backend_a, "from-a").await;
    common::start_mock_backend(backend_b, "from-b").await;
    let (_pool, shutdown, server) = common::start_balancer(balancer, common::quiet_config()).await;

    let client = reqwest::Client::new();
    let base = format!("http://{balancer}");

    // No backends yet: proxying is a 503.
    let res = client.get(format!("{base}/hello")).send().await.unwrap();
    assert_eq!(res.status(), 503);

    for url in [
        format!("http://{backend_a}/"),
        format!("http://{backend_b}/"),
    ] {
        let res = client
            .post(format!("{base}/_control/add"))
            .json(&json!({ "url": url }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    // Round robin alternates between the two.
    let first = client
        .get(format!("{base}/hello"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let second = client
        .get(format!("{base}/hello"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(first, "from-a");
    assert_eq!(second, "from-b");

    // Registry-ordered snapshots, all healthy, nothing in flight.
    let listed: Value = client
        .get(format!("{base}/_control/list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["address"], format!("http://{backend_a}/"));
    assert_eq!(listed[0]["healthy"], true);
    assert_eq!(listed[0]["active_connections"], 0);

    // Both selections show up in the stats windows.
    let stats: Value = client
        .get(format!("{base}/_control/stats"))
        .query(&[("periods", "5m,all")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["5m"][format!("http://{backend_a}/")], 1);
    assert_eq!(stats["all"][format!("http://{backend_b}/")], 1);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after shutdown")
        .unwrap();
}

#[tokio::test]
async fn control_errors_map_to_client_statuses() {
    let balancer: SocketAddr = "127.0.0.1:28284".parse().unwrap();
    let (_pool, shutdown, _server) =
        common::start_balancer(balancer, common::quiet_config()).await;

    let client = reqwest::Client::new();
    let base = format!("http://{balancer}");

    let add = |url: &str| {
        client
            .post(format!("{base}/_control/add"))
            .json(&json!({ "url": url }))
            .send()
    };

    assert_eq!(add("http://127.0.0.1:28285/").await.unwrap().status(), 200);
    // Duplicate registration conflicts.
    assert_eq!(add("http://127.0.0.1:28285/").await.unwrap().status(), 409);
    // Unparseable URL is rejected up front.
    assert_eq!(add("not a url").await.unwrap().status(), 400);
    // Parseable but unproxyable URLs are rejected too: wrong scheme,
    // TLS the proxy cannot speak upstream, no host to connect to.
    assert_eq!(add("mailto:alice@example.com").await.unwrap().status(), 400);
    assert_eq!(add("https://127.0.0.1:28285/").await.unwrap().status(), 400);
    assert_eq!(add("unix:/var/run/app.sock").await.unwrap().status(), 400);

    let res = client
        .post(format!("{base}/_control/remove"))
        .json(&json!({ "url": "http://127.0.0.1:9999/" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client
        .post(format!("{base}/_control/scheduler"))
        .json(&json!({ "algorithm": "source_hash" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .get(format!("{base}/_control/stats"))
        .query(&[("periods", "5m,7m")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    shutdown.trigger();
}

#[tokio::test]
async fn timed_out_requests_still_release_their_backend() {
    let backend: SocketAddr = "127.0.0.1:28289".parse().unwrap();
    let balancer: SocketAddr = "127.0.0.1:28290".parse().unwrap();

    common::start_stalled_backend(backend).await;
    let mut config = common::quiet_config();
    config.timeouts.request_secs = 1;
    let (pool, shutdown, _server) = common::start_balancer(balancer, config).await;

    let client = reqwest::Client::new();
    pool.add(format!("http://{backend}/").parse().unwrap(), 1)
        .unwrap();

    // The backend never answers, so the timeout layer cancels the
    // proxying mid-forward and answers for it.
    let res = client
        .get(format!("http://{balancer}/slow"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 408);

    // The cancelled request must not stay counted as in flight, or
    // Least Connections would steer away from this backend forever.
    assert_eq!(pool.list()[0].active_connections, 0);

    shutdown.trigger();
}

#[tokio::test]
async fn scheduler_swap_takes_effect() {
    let backend_a: SocketAddr = "127.0.0.1:28286".parse().unwrap();
    let backend_b: SocketAddr = "127.0.0.1:28287".parse().unwrap();
    let balancer: SocketAddr = "127.0.0.1:28288".parse().unwrap();

    common::start_mock_backend(backend_a, "from-a").await;
    common::start_mock_backend(backend_b, "from-b").await;
    let (_pool, shutdown, _server) =
        common::start_balancer(balancer, common::quiet_config()).await;

    let client = reqwest::Client::new();
    let base = format!("http://{balancer}");

    for (url, weight) in [
        (format!("http://{backend_a}/"), 3),
        (format!("http://{backend_b}/"), 1),
    ] {
        client
            .post(format!("{base}/_control/add"))
            .json(&json!({ "url": url, "weight": weight }))
            .send()
            .await
            .unwrap();
    }
    let res = client
        .post(format!("{base}/_control/scheduler"))
        .json(&json!({ "algorithm": "weighted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let mut bodies = Vec::new();
    for _ in 0..4 {
        bodies.push(
            client
                .get(format!("{base}/"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap(),
        );
    }
    assert_eq!(bodies.iter().filter(|b| *b == "from-a").count(), 3);
    assert_eq!(bodies.iter().filter(|b| *b == "from-b").count(), 1);

    shutdown.trigger();
}
