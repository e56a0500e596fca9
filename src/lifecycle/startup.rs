//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the immutable runtime values from a resolved configuration
//! - Initialize subsystems in dependency order
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)
//! - Once a stop is committed, the controller owns the exit code

use std::sync::Arc;

use crate::config::StreamerConfig;
use crate::http::{handlers::VersionInfo, HttpServer};
use crate::lifecycle::{Exit, ProcessController, ProcessExit, SelfRelaunch, Shutdown, SignalBridge};
use crate::net::{self, ListenerError};
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Start every subsystem and serve until the process is told to stop.
pub async fn run(config: StreamerConfig) -> Result<(), StartupError> {
    let config = Arc::new(config);
    let version = VersionInfo::current();
    tracing::info!(
        version = version.version,
        build_date = version.build_date,
        "..... Streamer application starting ......"
    );
    tracing::info!(
        logs_dir = ?config.tail.logs_dir,
        http_port = config.listener.http_port,
        https = config.tls.enabled,
        ip_filter = !config.access.allowed_ips.is_empty(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let exit: Arc<dyn Exit> = Arc::new(ProcessExit);
    SignalBridge::new(Arc::clone(&exit))
        .install()
        .map_err(StartupError::Signals)?;

    let shutdown = Arc::new(Shutdown::new());
    let controller = Arc::new(ProcessController::new(
        Arc::clone(&shutdown),
        config.lifecycle.stop_timeout(),
        exit,
        Arc::new(SelfRelaunch),
    ));
    let server = HttpServer::new(Arc::clone(&config), Arc::clone(&shutdown), controller);

    let listener = net::bind(&config.listener.http_address()).await?;
    let http = server.clone().run(listener, shutdown.subscribe());

    if config.tls.enabled {
        let tls = net::load_tls_config(&config.tls)
            .await
            .map_err(StartupError::Tls)?;
        let tls_listener = net::bind(&config.listener.https_address()).await?;
        let https = server.run_tls(tls_listener, tls, shutdown.subscribe());
        tokio::try_join!(http, https).map_err(StartupError::Server)?;
    } else {
        http.await.map_err(StartupError::Server)?;
    }

    if shutdown.is_triggered() {
        // The stop task exits the process with its own code.
        std::future::pending::<()>().await;
    }
    Ok(())
}
