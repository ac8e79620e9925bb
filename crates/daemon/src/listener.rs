// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task metadata listener.
//!
//! Serves per-container metadata to workloads over loopback HTTP. The
//! accept loop runs in a spawned task and handles each connection without
//! blocking the daemon; lookups go against the shared task state store.
//!
//! Route: `GET /v3/{endpoint_id}` — container metadata JSON. Unknown
//! endpoints get a 404 JSON body; derivation failures a 500. Bad requests
//! never take the process down.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::metadata::{self, MetadataError};
use crate::state::TaskStateStore;

/// Listener task serving the metadata endpoint on loopback.
pub struct MetadataListener {
    tcp: TcpListener,
    state: Arc<Mutex<TaskStateStore>>,
}

impl MetadataListener {
    /// Bind on 127.0.0.1. Port 0 picks an ephemeral port (tests).
    pub async fn bind(port: u16, state: Arc<Mutex<TaskStateStore>>) -> io::Result<Self> {
        let tcp = TcpListener::bind(("127.0.0.1", port)).await?;
        Ok(Self { tcp, state })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp.local_addr()
    }

    /// Run the accept loop until `shutdown` is cancelled, spawning a task
    /// per connection.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("metadata listener shutting down");
                    break;
                }
                result = self.tcp.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!(%addr, "metadata connection");
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, state).await {
                                warn!(error = %e, "metadata connection error");
                            }
                        });
                    }
                    Err(e) => error!("metadata accept error: {}", e),
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<Mutex<TaskStateStore>>,
) -> io::Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain headers; GET requests carry no body.
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    let (status, body) = route(method, path, &state);
    debug!(method, path, status, "metadata request");
    write_response(&mut writer, status, &body).await
}

fn route(method: &str, path: &str, state: &Arc<Mutex<TaskStateStore>>) -> (u16, String) {
    if method != "GET" {
        return (405, json_message("method not allowed"));
    }
    let endpoint_id = match path.strip_prefix("/v3/") {
        Some(rest) => rest.trim_end_matches('/'),
        None => return (404, json_message("not found")),
    };
    if endpoint_id.is_empty() || endpoint_id.contains('/') {
        return (404, json_message("not found"));
    }

    let store = state.lock();
    match metadata::metadata_for_endpoint(&store, endpoint_id) {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(body) => (200, body),
            Err(e) => (500, json_message(&format!("encoding metadata: {}", e))),
        },
        Err(e @ (MetadataError::UnknownEndpoint(_) | MetadataError::ContainerNotFound(_))) => {
            (404, json_message(&e.to_string()))
        }
        Err(e @ MetadataError::SettingsUnavailable(_)) => (500, json_message(&e.to_string())),
    }
}

/// JSON-encoded message body, matching the error shape of the data route.
fn json_message(message: &str) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| "\"internal error\"".to_string())
}

async fn write_response<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    status: u16,
    body: &str,
) -> io::Result<()> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
