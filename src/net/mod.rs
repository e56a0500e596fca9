//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! config.listener
//!     → listener.rs (bind plaintext socket)
//!     → tls.rs (load PEM material for the HTTPS listener)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::load_tls_config;
