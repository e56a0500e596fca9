//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the streamer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the log streamer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StreamerConfig {
    /// Listener configuration (ports, bind host).
    pub listener: ListenerConfig,

    /// TLS material for the HTTPS listener.
    pub tls: TlsConfig,

    /// Tail-follow settings.
    pub tail: TailConfig,

    /// Access policy inputs (CORS, IP allow-list, token secret).
    pub access: AccessConfig,

    /// Stop/restart behaviour.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host/IP both listeners bind to.
    pub bind_host: String,

    /// Plaintext HTTP port.
    pub http_port: u16,

    /// HTTPS port, used only when TLS is enabled.
    pub https_port: u16,

    /// Timeout applied to every non-streaming route.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            http_port: 5005,
            https_port: 8443,
            request_timeout_secs: 30,
        }
    }
}

impl ListenerConfig {
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.http_port)
    }

    pub fn https_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.https_port)
    }
}

/// TLS configuration for the HTTPS listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS alongside plaintext HTTP.
    pub enabled: bool,

    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cert_path: PathBuf::from("cert-streamer.pem"),
            key_path: PathBuf::from("decrypted_key.pem"),
        }
    }
}

/// Tail-follow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TailConfig {
    /// Directory holding the tailable files.
    pub logs_dir: PathBuf,

    /// File streamed when the request names none.
    pub default_file: String,

    /// Required file-name suffix, including the dot.
    pub extension: String,

    /// Delay between two polls of the same file, in milliseconds.
    pub poll_interval_ms: u64,

    /// Frames buffered between a session and its response body.
    pub channel_capacity: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("."),
            default_file: "mylog.log".to_string(),
            extension: ".log".to_string(),
            poll_interval_ms: 1000,
            channel_capacity: 256,
        }
    }
}

impl TailConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Inputs of the access policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Allowed CORS origins; `*` allows any origin.
    pub cors_origins: Vec<String>,

    /// Allowed client addresses. Empty disables the filter.
    pub allowed_ips: Vec<String>,

    /// HMAC secret bearer tokens are verified against.
    pub jwt_secret: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "https://anotherdomain.com".to_string(),
                "http://localhost:1972".to_string(),
            ],
            allowed_ips: Vec::new(),
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: "qwertyuiopasdfghjklzxcvbnm123456".to_string(),
        }
    }
}

/// Stop/restart configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Deadline for graceful cleanup before a forced exit.
    pub stop_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: 30,
        }
    }
}

impl LifecycleConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    pub log_level: String,

    /// File receiving a copy of every log line. Empty disables it.
    pub log_file: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: "streamer.log".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
