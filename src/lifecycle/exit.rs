//! Process termination primitives.

/// Clean stop, or exit on an OS signal.
pub const EXIT_CLEAN: i32 = 0;
/// Stop whose cleanup exceeded its deadline.
pub const EXIT_FORCED: i32 = 1;
/// Configuration or bind failure during startup.
pub const EXIT_STARTUP: i32 = 2;

/// How the process ends itself. Swapped out in tests.
pub trait Exit: Send + Sync + 'static {
    /// Exit with `code`.
    fn exit(&self, code: i32);

    /// Ask the OS to terminate this process.
    fn terminate_self(&self);
}

/// Real process exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl Exit for ProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }

    #[cfg(unix)]
    fn terminate_self(&self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Err(e) = kill(Pid::this(), Signal::SIGTERM) {
            tracing::error!(error = %e, "Failed to send SIGTERM to self, exiting directly");
            std::process::exit(EXIT_CLEAN);
        }
    }

    #[cfg(not(unix))]
    fn terminate_self(&self) {
        std::process::exit(EXIT_CLEAN)
    }
}
