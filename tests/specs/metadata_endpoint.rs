//! Metadata endpoint specs
//!
//! Round-trip a workload's metadata request over a real loopback socket.

use std::sync::Arc;

use dockhand_core::EndpointId;
use dockhand_daemon::listener::MetadataListener;
use dockhand_daemon::state::{ContainerRecord, TaskStateStore};
use dockhand_runtime::{EndpointSettings, NetworkSettings};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

async fn get(addr: std::net::SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let raw = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let status = response
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = response.split("\r\n\r\n").nth(1).unwrap_or_default().to_string();
    (status, body)
}

#[tokio::test]
async fn workload_reads_its_networks_through_the_endpoint() {
    let endpoint_id = EndpointId::new();
    let mut networks = std::collections::HashMap::new();
    networks.insert(
        "bridge".to_string(),
        EndpointSettings { ip_address: "172.17.0.2".to_string() },
    );
    networks.insert(
        "overlay-prod".to_string(),
        EndpointSettings { ip_address: "10.0.1.7".to_string() },
    );

    let state = Arc::new(Mutex::new(TaskStateStore::default()));
    state.lock().record_container(ContainerRecord {
        container_id: "abc123".to_string(),
        name: "/worker-1".to_string(),
        endpoint_id: endpoint_id.clone(),
        network_mode: "bridge".to_string(),
        network_settings: Some(NetworkSettings { ip_address: String::new(), networks }),
    });

    let listener = MetadataListener::bind(0, Arc::clone(&state)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    tokio::spawn(listener.run(shutdown.clone()));

    let (status, body) = get(addr, &format!("/v3/{}", endpoint_id)).await;
    assert_eq!(status, 200);

    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["container_id"], "abc123");
    let networks = parsed["networks"].as_array().unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[0]["network_mode"], "bridge");
    assert_eq!(networks[1]["network_mode"], "overlay-prod");
    assert_eq!(networks[1]["ipv4_addresses"][0], "10.0.1.7");

    let (status, _) = get(addr, "/v3/mde-unknown").await;
    assert_eq!(status, 404);

    shutdown.cancel();
}
