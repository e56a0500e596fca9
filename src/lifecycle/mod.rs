//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Build policy → Install signal bridge → Start listeners
//!
//! Stop (controller.rs):
//!     POST /stop → ack → Shutdown::trigger → drain servers → exit(0)
//!                                          └─ deadline hit → exit(1)
//!
//! Restart (controller.rs):
//!     POST /restart → spawn replacement → ack → SIGTERM self
//!     replacement: bind retries while the parent still holds the ports
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → exit immediately
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Stop has a timeout: forced exit after deadline
//! - Open tail streams are cut, not drained

pub mod controller;
pub mod exit;
pub mod shutdown;
pub mod signals;
pub mod startup;

/// Exit and relaunch doubles for tests
pub mod test_utils;

pub use controller::{ControlError, ProcessController, ProcessState, Relaunch, SelfRelaunch};
pub use exit::{Exit, ProcessExit, EXIT_CLEAN, EXIT_FORCED, EXIT_STARTUP};
pub use shutdown::Shutdown;
pub use signals::SignalBridge;
