//! IIS virtual directory resource: path resolution, discovery, command synthesis.

pub mod commands;
pub mod discovery;
pub mod error;
pub mod path;
pub mod provider;

pub use error::*;
pub use provider::*;

use crate::framework::{CommandRunner, Reconciler};
use crate::lifecycle::ProviderConfig;
use std::sync::Arc;

/// Creates a reconciler for virtual directories that talks through `runner`.
pub fn new(runner: Arc<dyn CommandRunner>, config: ProviderConfig) -> Reconciler<VirtualDirectoryProvider> {
    Reconciler::new(VirtualDirectoryProvider::new(runner, config))
}
