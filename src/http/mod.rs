//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → security pipeline (IP → CORS → Auth; /alive: CORS only)
//!     → stream.rs (SSE tail-follow) | handlers.rs (version, listing, stop, restart)
//!     → Send to client
//! ```

pub mod handlers;
pub mod server;
pub mod stream;

pub use server::{AppState, HttpServer};
