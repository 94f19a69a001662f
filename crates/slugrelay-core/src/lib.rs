//! Core types and configuration for slugrelay.
//!
//! This crate defines the `slugrelay.toml` schema ([`RelayConfig`]),
//! `Procfile` parsing ([`ProcessTypes`]), and shared error types.

pub mod config;
pub mod error;
pub mod procfile;

pub use config::{RelayConfig, ServerConfig, TimeoutConfig, ToolsConfig};
pub use error::{Error, Result};
pub use procfile::ProcessTypes;
