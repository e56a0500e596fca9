//! Stop and restart of the host process.
//!
//! ```text
//!            stop                         cleanup done
//! Running ─────────▶ StoppingGraceful ───────────────▶ exit(0)
//!    │                     │ deadline exceeded
//!    │                     ▼
//!    │               StoppingForced ──▶ exit(1)
//!    │  restart
//!    └─────────▶ Restarting ──spawn ok──▶ terminate self
//!                    │ spawn failed
//!                    ▼
//!                 Running
//! ```

use std::ffi::OsString;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::lifecycle::exit::{Exit, EXIT_CLEAN, EXIT_FORCED};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Time left for the restart acknowledgment to reach the client.
pub const RESTART_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessState {
    Running = 0,
    StoppingGraceful = 1,
    StoppingForced = 2,
    Restarting = 3,
}

impl ProcessState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ProcessState::StoppingGraceful,
            2 => ProcessState::StoppingForced,
            3 => ProcessState::Restarting,
            _ => ProcessState::Running,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("process is already {0:?}")]
    AlreadyCommitted(ProcessState),
    #[error("failed to spawn replacement process: {0}")]
    Spawn(#[source] std::io::Error),
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = match self {
            ControlError::AlreadyCommitted(_) => StatusCode::CONFLICT,
            ControlError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("{}\n", self)).into_response()
    }
}

/// Starts the replacement process on restart.
pub trait Relaunch: Send + Sync + 'static {
    /// Spawn a detached copy of this process; returns its pid.
    fn relaunch(&self) -> std::io::Result<u32>;
}

/// Re-executes the current binary with the same arguments and environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfRelaunch;

impl Relaunch for SelfRelaunch {
    fn relaunch(&self) -> std::io::Result<u32> {
        let exe = std::env::current_exe()?;
        let args: Vec<OsString> = std::env::args_os().skip(1).collect();

        let mut command = Command::new(exe);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Own process group, so the child survives our termination.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn()?;
        Ok(child.id())
    }
}

/// Commits and carries out stop/restart. At most one transition out of
/// `Running` is ever committed.
pub struct ProcessController {
    state: AtomicU8,
    shutdown: Arc<Shutdown>,
    stop_timeout: Duration,
    exit: Arc<dyn Exit>,
    relauncher: Arc<dyn Relaunch>,
}

impl ProcessController {
    pub fn new(
        shutdown: Arc<Shutdown>,
        stop_timeout: Duration,
        exit: Arc<dyn Exit>,
        relauncher: Arc<dyn Relaunch>,
    ) -> Self {
        Self {
            state: AtomicU8::new(ProcessState::Running as u8),
            shutdown,
            stop_timeout,
            exit,
            relauncher,
        }
    }

    pub fn state(&self) -> ProcessState {
        ProcessState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn commit(&self, next: ProcessState) -> Result<(), ControlError> {
        self.state
            .compare_exchange(
                ProcessState::Running as u8,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
            .map_err(|current| ControlError::AlreadyCommitted(ProcessState::from_u8(current)))
    }

    /// Commit a stop and run cleanup in the background. Returns as soon as
    /// the transition is committed; the caller never sees the exit path.
    pub fn stop(self: &Arc<Self>) -> Result<(), ControlError> {
        self.commit(ProcessState::StoppingGraceful)?;
        tracing::info!(timeout_secs = self.stop_timeout.as_secs(), "Stop requested");
        metrics::record_lifecycle("stop");

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let code = controller.cleanup().await;
            controller.exit.exit(code);
        });
        Ok(())
    }

    async fn cleanup(&self) -> i32 {
        match tokio::time::timeout(self.stop_timeout, self.shutdown.trigger_and_drain()).await {
            Ok(()) => {
                tracing::info!("Cleanup completed. Exiting...");
                EXIT_CLEAN
            }
            Err(_) => {
                self.state
                    .store(ProcessState::StoppingForced as u8, Ordering::SeqCst);
                tracing::warn!("Cleanup timed out. Exiting forcefully...");
                EXIT_FORCED
            }
        }
    }

    /// Spawn the replacement, then terminate self after a short grace.
    /// A spawn failure rolls the state back to `Running`.
    pub fn restart(&self) -> Result<u32, ControlError> {
        self.commit(ProcessState::Restarting)?;
        metrics::record_lifecycle("restart");

        match self.relauncher.relaunch() {
            Ok(pid) => {
                tracing::info!(child_pid = pid, "Replacement process spawned, terminating");
                let exit = Arc::clone(&self.exit);
                tokio::spawn(async move {
                    tokio::time::sleep(RESTART_GRACE).await;
                    exit.terminate_self();
                });
                Ok(pid)
            }
            Err(e) => {
                tracing::error!(error = %e, "Restart failed, staying up");
                self.state
                    .store(ProcessState::Running as u8, Ordering::SeqCst);
                Err(ControlError::Spawn(e))
            }
        }
    }
}
