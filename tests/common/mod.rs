#![allow(dead_code)]

//! Shared utilities for integration and load testing.

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use file_relay::config::ServerConfig;
use file_relay::{HttpServer, Shutdown};
use tempfile::NamedTempFile;

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Write `data` to a fresh temporary file.
pub fn fixture(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Start a server for `source` on an ephemeral port.
///
/// The server stops when the returned `Shutdown` is triggered or dropped.
pub async fn start_server(source: &Path, chunk_size: usize) -> (SocketAddr, Shutdown) {
    let mut config = ServerConfig::default();
    config.source.path = source.to_path_buf();
    config.relay.chunk_size = chunk_size;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Listener is already bound; give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// HTTP client that never reuses connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
