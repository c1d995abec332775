//! Runtime setup: configuration, manifests, and observability.
//!
//! # Main Components
//!
//! - [`ProviderConfig`] - Interpreter path and local-path verification, read from the environment
//! - [`load_manifest`] - Reads a JSON list of desired virtual directories
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod config;
pub mod tracing;

pub use self::config::*;
pub use self::tracing::*;
