//! Log Streamer Library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod tail;

pub use config::StreamerConfig;
pub use http::HttpServer;
pub use lifecycle::{ProcessController, Shutdown};
