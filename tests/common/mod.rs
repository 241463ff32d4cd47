//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use profile_aggregator::config::AppConfig;
use profile_aggregator::http::HttpServer;
use profile_aggregator::lifecycle::Shutdown;

pub const USER_PATH: &str = "/users/octocat";
pub const REPOS_PATH: &str = "/users/octocat/repos";

/// A scripted stand-in for the upstream API.
///
/// The handler receives the request path and the 1-based hit number for
/// that path, and returns the status and body to send back.
pub struct MockUpstream {
    addr: SocketAddr,
    hits: Arc<Mutex<HashMap<String, u32>>>,
}

impl MockUpstream {
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(String, u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (u16, String)> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits: Arc<Mutex<HashMap<String, u32>>> = Arc::default();
        let handler = Arc::new(handler);

        let counters = hits.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let handler = handler.clone();
                let counters = counters.clone();
                tokio::spawn(async move {
                    serve_one(socket, handler.as_ref(), &counters).await;
                });
            }
        });

        Self { addr, hits }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far for `path`.
    pub fn hits(&self, path: &str) -> u32 {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn serve_one<F, Fut>(
    mut socket: TcpStream,
    handler: &F,
    counters: &Mutex<HashMap<String, u32>>,
) where
    F: Fn(String, u32) -> Fut,
    Fut: Future<Output = (u16, String)>,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let hit = {
        let mut counters = counters.lock().unwrap();
        let count = counters.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let (status, body) = handler(path, hit).await;
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line(status),
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn status_line(status: u16) -> String {
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    format!("{} {}", status, reason)
}

pub fn user_json(login: &str) -> String {
    serde_json::json!({
        "login": login,
        "id": 1,
        "avatar_url": format!("https://avatars.test/{login}"),
        "url": format!("https://api.test/users/{login}"),
        "name": "The Octocat",
        "location": "San Francisco",
        "email": null,
        "created_at": "2011-01-25T18:44:36Z",
        "site_admin": false
    })
    .to_string()
}

pub fn repos_json(names: &[&str]) -> String {
    let repos: Vec<_> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "url": format!("https://api.test/repos/octocat/{name}"),
                "fork": false
            })
        })
        .collect();
    serde_json::Value::Array(repos).to_string()
}

/// Defaults pointed at `base_url`, with millisecond backoff.
pub fn test_config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = base_url.to_string();
    config.upstream.request_timeout_ms = 2_000;
    config.retry.base_delay_ms = 5;
    config.retry.max_delay_ms = 20;
    config
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start(config: &AppConfig) -> Self {
        let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer::from_config(config).unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}
