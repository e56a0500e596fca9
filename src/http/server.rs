//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (access control, tracing, request ID, timeouts)
//! - Serve plaintext and TLS listeners from the same router
//! - Stop accepting when the shutdown coordinator fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::StreamerConfig;
use crate::http::{handlers, stream};
use crate::lifecycle::{ProcessController, Shutdown};
use crate::security::{self, AccessPolicy};

/// Grace period for open TLS connections once shutdown fires.
const TLS_DRAIN: Duration = Duration::from_secs(5);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StreamerConfig>,
    pub shutdown: Arc<Shutdown>,
    pub controller: Arc<ProcessController>,
}

/// HTTP server for the log streamer.
#[derive(Clone)]
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server. The access policy is built here, once.
    pub fn new(
        config: Arc<StreamerConfig>,
        shutdown: Arc<Shutdown>,
        controller: Arc<ProcessController>,
    ) -> Self {
        let policy = Arc::new(AccessPolicy::from_config(&config.access));
        let state = AppState {
            config,
            shutdown,
            controller,
        };
        Self {
            router: Self::build_router(state, policy),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, policy: Arc<AccessPolicy>) -> Router {
        let request_timeout = Duration::from_secs(state.config.listener.request_timeout_secs);

        // Streams are long-lived and stay outside the request timeout.
        let api = Router::new()
            .route("/version", get(handlers::version))
            .route("/list-files", get(handlers::list_files))
            .route("/stop", post(handlers::stop))
            .route("/restart", post(handlers::restart))
            .layer(TimeoutLayer::new(request_timeout))
            .route("/stream-logs", get(stream::stream_logs));

        let protected = security::protect(api, policy.clone());
        let public = security::cors_only(Router::new().route("/alive", get(handlers::alive)), policy);

        Router::new()
            .merge(protected)
            .merge(public)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve plaintext HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        // Held until serving ends; the stop path waits for it to drop.
        let _running = shutdown.resubscribe();
        tracing::info!(address = %addr, "HTTP server started");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!(address = %addr, "HTTP server draining");
            })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `listener` until `shutdown` fires.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let listener = listener.into_std()?;
        let _running = shutdown.resubscribe();
        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(address = %addr, "HTTPS server draining");
            drain.graceful_shutdown(Some(TLS_DRAIN));
        });

        tracing::info!(address = %addr, "HTTPS server started");
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!(address = %addr, "HTTPS server stopped");
        Ok(())
    }
}
