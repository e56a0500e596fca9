//! Live tail-follow of log files.
//!
//! # Data Flow
//! ```text
//! ?file=<name>
//!     → name.rs (base-name + extension validation)
//!     → session.rs Opening (stat, open; 404 before any frame)
//!     → session.rs Polling (re-stat, truncation reset, read complete lines)
//!     → mpsc channel → http/stream.rs (SSE frames)
//! ```
//!
//! # Design Decisions
//! - Polling with a fixed interval instead of filesystem notifications
//! - Truncation is detected by size shrinkage only
//! - Cancellation is cooperative, checked at every poll boundary

pub mod error;
pub mod name;
pub mod session;

pub use error::TailError;
pub use name::{list_log_files, LogFileName};
pub use session::{PollOutcome, TailFrame, TailSession};
