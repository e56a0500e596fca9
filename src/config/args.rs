//! Command-line and environment overrides.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::StreamerConfig;

#[derive(Debug, Parser)]
#[command(name = "log-streamer")]
#[command(about = "Expose log files for live tailing over HTTP", long_about = None)]
pub struct Args {
    /// Optional TOML configuration file
    #[arg(long, env = "STREAMER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listening port
    #[arg(long, env = "STREAMER_PORT")]
    pub port: Option<u16>,

    /// HTTPS listening port
    #[arg(long, env = "STREAMER_HTTPS_PORT")]
    pub https_port: Option<u16>,

    /// Enable HTTPS server
    #[arg(long, env = "STREAMER_ENABLE_HTTPS", value_parser = parse_switch)]
    pub enable_https: Option<bool>,

    /// Path to TLS certificate
    #[arg(long, env = "STREAMER_TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key
    #[arg(long, env = "STREAMER_TLS_KEY")]
    pub tls_key: Option<PathBuf>,

    /// Directory where .log files are located
    #[arg(long, env = "STREAMER_LOGS_DIR")]
    pub logs_dir: Option<PathBuf>,

    /// Comma-separated list of allowed CORS origins (use * for all)
    #[arg(long, env = "STREAMER_CORS_ORIGINS")]
    pub cors_origins: Option<String>,

    /// Comma-separated list of allowed client IPs (empty to disable)
    #[arg(long, env = "STREAMER_ALLOWED_IPS")]
    pub allowed_ips: Option<String>,

    /// Secret bearer tokens are verified against
    #[arg(long, env = "STREAMER_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
}

impl Args {
    /// Overlay every option that was given onto `config`.
    pub fn apply(&self, config: &mut StreamerConfig) {
        if let Some(port) = self.port {
            config.listener.http_port = port;
        }
        if let Some(port) = self.https_port {
            config.listener.https_port = port;
        }
        if let Some(enabled) = self.enable_https {
            config.tls.enabled = enabled;
        }
        if let Some(path) = &self.tls_cert {
            config.tls.cert_path = path.clone();
        }
        if let Some(path) = &self.tls_key {
            config.tls.key_path = path.clone();
        }
        if let Some(dir) = &self.logs_dir {
            config.tail.logs_dir = dir.clone();
        }
        if let Some(origins) = &self.cors_origins {
            let origins = split_list(origins);
            if !origins.is_empty() {
                config.access.cors_origins = origins;
            }
        }
        if let Some(ips) = &self.allowed_ips {
            config.access.allowed_ips = split_list(ips);
        }
        if let Some(secret) = &self.jwt_secret {
            config.access.jwt_secret = secret.clone();
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected true/false, got '{}'", other)),
    }
}
