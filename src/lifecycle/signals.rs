//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT, and SIGTERM where the platform has it
//! - Exit immediately on receipt; no cleanup runs on this path
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before `install` returns, so no signal is missed

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::exit::{Exit, EXIT_CLEAN};
use crate::observability::metrics;

/// Bridges OS signals to process exit.
pub struct SignalBridge {
    exit: Arc<dyn Exit>,
}

impl SignalBridge {
    pub fn new(exit: Arc<dyn Exit>) -> Self {
        Self { exit }
    }

    /// Register the handlers and spawn the listener task.
    pub fn install(self) -> std::io::Result<JoinHandle<()>> {
        let mut signals = Signals::register()?;
        Ok(tokio::spawn(async move {
            let name = signals.recv().await;
            tracing::info!(signal = name, "Received signal, server stopped");
            metrics::record_lifecycle("signal");
            self.exit.exit(EXIT_CLEAN);
        }))
    }
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

// No SIGTERM here; only interrupt is observed.
#[cfg(not(unix))]
struct Signals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl Signals {
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "CTRL_C"
    }
}
