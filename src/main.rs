//! Log Streamer
//!
//! Exposes log files of the host for live tailing over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   LOG STREAMER                   │
//!                         │                                                  │
//!   Client Request        │  ┌─────────┐   ┌──────────────────────────────┐  │
//!   ──────────────────────┼─▶│   net   │──▶│ security: IP → CORS → Auth   │  │
//!                         │  │http/tls │   └──────────────┬───────────────┘  │
//!                         │  └─────────┘                  │                  │
//!                         │                               ▼                  │
//!                         │          ┌───────────────────────────────────┐   │
//!   SSE frames            │          │ http: stream-logs │ list │ stop … │   │
//!   ◀─────────────────────┼──────────│      │                   │        │   │
//!                         │          └──────┼───────────────────┼────────┘   │
//!                         │                 ▼                   ▼            │
//!                         │          ┌────────────┐     ┌──────────────┐     │
//!                         │          │    tail    │     │  lifecycle   │     │
//!                         │          │  sessions  │     │ stop/restart │     │
//!                         │          └────────────┘     │   signals    │     │
//!                         │                             └──────────────┘     │
//!                         └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use log_streamer::config::{resolve_config, Args};
use log_streamer::lifecycle::{startup, EXIT_STARTUP};
use log_streamer::observability::logging;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(EXIT_STARTUP);
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Error opening log file: {}", e);
        std::process::exit(EXIT_STARTUP);
    }

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Startup failed");
        std::process::exit(EXIT_STARTUP);
    }

    tracing::info!("Shutdown complete");
}
