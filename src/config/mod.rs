//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment + flags (args.rs)
//!     → validation.rs (semantic checks)
//!     → StreamerConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    AccessConfig, LifecycleConfig, ListenerConfig, ObservabilityConfig, StreamerConfig,
    TailConfig, TlsConfig,
};
