//! Configuration management for keepsake.
//!
//! Settings come from an optional `keepsake.toml` plus environment
//! overrides. The most important decision made here is whether a remote
//! backend is configured at all: presence of the remote credentials
//! activates the remote entry store, and their absence selects clean,
//! fully-functional local-only mode. That is a required configuration, not
//! an error path.

pub mod config;

pub use config::{AppConfig, ConfigError, LocalConfig, RecapConfig, RemoteConfig};
