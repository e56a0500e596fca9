//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::{Extension, Router};
use futures_util::StreamExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::sync::mpsc;

use log_streamer::config::StreamerConfig;
use log_streamer::lifecycle::{ProcessController, Shutdown};

pub use log_streamer::lifecycle::test_utils::{ExitEvent, FakeRelaunch, RecordingExit};
use log_streamer::security::TokenClaims;
use log_streamer::HttpServer;

pub const SECRET: &str = "integration-test-secret";
pub const POLL: Duration = Duration::from_millis(50);

/// Configuration pointing at `logs_dir` with fast polling and no TLS.
pub fn test_config(logs_dir: &Path) -> StreamerConfig {
    let mut config = StreamerConfig::default();
    config.tls.enabled = false;
    config.tail.logs_dir = logs_dir.to_path_buf();
    config.tail.poll_interval_ms = POLL.as_millis() as u64;
    config.access.jwt_secret = SECRET.to_string();
    config.lifecycle.stop_timeout_secs = 5;
    config.observability.log_file.clear();
    config
}

/// Sign a token with `secret` expiring `exp_offset_secs` from now.
pub fn token_with(secret: &str, exp_offset_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = TokenClaims {
        sub: Some("integration".into()),
        exp: Some(now + exp_offset_secs),
        iat: Some(now),
        nbf: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

pub fn valid_token() -> String {
    token_with(SECRET, 3600)
}

pub fn bearer() -> String {
    format!("Bearer {}", valid_token())
}

pub struct TestApp {
    pub server: HttpServer,
    pub shutdown: Arc<Shutdown>,
    pub controller: Arc<ProcessController>,
    pub exits: mpsc::UnboundedReceiver<ExitEvent>,
}

impl TestApp {
    pub fn new(config: StreamerConfig) -> Self {
        Self::with_relaunch(config, Vec::new())
    }

    pub fn with_relaunch(config: StreamerConfig, results: Vec<std::io::Result<u32>>) -> Self {
        let (exit, exits) = RecordingExit::new();
        let shutdown = Arc::new(Shutdown::new());
        let controller = Arc::new(ProcessController::new(
            Arc::clone(&shutdown),
            config.lifecycle.stop_timeout(),
            exit,
            FakeRelaunch::new(results),
        ));
        let server = HttpServer::new(Arc::new(config), Arc::clone(&shutdown), Arc::clone(&controller));
        Self {
            server,
            shutdown,
            controller,
            exits,
        }
    }

    /// Router that sees every request as coming from `peer`.
    pub fn router_from(&self, peer: &str) -> Router {
        let addr: SocketAddr = peer.parse().unwrap();
        self.server.router().layer(Extension(ConnectInfo(addr)))
    }

    pub fn router(&self) -> Router {
        self.router_from("127.0.0.1:40000")
    }

    /// Serve on an ephemeral port; returns the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = self.server.clone();
        let shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, shutdown).await;
        });
        format!("http://{}", addr)
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Minimal SSE reader over a streaming response body.
pub struct SseReader {
    body: std::pin::Pin<Box<dyn futures_util::Stream<Item = reqwest::Result<axum::body::Bytes>> + Send>>,
    buf: String,
}

impl SseReader {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            body: Box::pin(response.bytes_stream()),
            buf: String::new(),
        }
    }

    /// Next `data:` payload, skipping comments. `None` on timeout or end of stream.
    pub async fn next_data(&mut self, wait: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            while let Some(end) = self.buf.find("\n\n") {
                let block: String = self.buf.drain(..end + 2).collect();
                let data: Vec<&str> = block
                    .lines()
                    .filter_map(|l| l.strip_prefix("data:"))
                    .map(|d| d.strip_prefix(' ').unwrap_or(d))
                    .collect();
                if !data.is_empty() {
                    return Some(data.join("\n"));
                }
            }
            match tokio::time::timeout_at(deadline, self.body.next()).await {
                Ok(Some(Ok(chunk))) => self.buf.push_str(&String::from_utf8_lossy(&chunk)),
                _ => return None,
            }
        }
    }

    /// Every data payload arriving within `wait`.
    pub async fn collect_for(&mut self, wait: Duration) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + wait;
        let mut frames = Vec::new();
        loop {
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            if left.is_zero() {
                return frames;
            }
            match self.next_data(left).await {
                Some(frame) => frames.push(frame),
                None => return frames,
            }
        }
    }
}

/// Open descriptors of this process pointing at `path`.
#[cfg(target_os = "linux")]
pub fn open_handles(path: &Path) -> usize {
    let target = std::fs::canonicalize(path).unwrap();
    std::fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| std::fs::read_link(e.path()).ok())
        .filter(|link| *link == target)
        .count()
}
