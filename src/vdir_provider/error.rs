//! Error types for the virtual directory provider.

use crate::framework::{Action, ChannelError};
use thiserror::Error;

/// Errors that can occur while reconciling one virtual directory.
///
/// Every variant names the resource it belongs to; none of them is fatal to
/// the rest of the batch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VirtualDirectoryError {
    /// A field the operation needs was not supplied. Nothing was sent to the host.
    #[error("{field} is a required parameter for virtual directory '{name}'")]
    MissingField { name: String, field: &'static str },

    /// The name does not identify a directory below a site.
    #[error("Invalid virtual directory name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Local path verification was requested and the path is missing.
    #[error("physicalpath doesn't exist for virtual directory '{name}': {path}")]
    PhysicalPathNotFound { name: String, path: String },

    /// The host ran the command and reported failure.
    #[error("Failed to {operation} virtual directory '{name}': {message}")]
    CommandFailed {
        name: String,
        operation: Action,
        message: String,
    },

    /// The command could not be run at all.
    #[error("Execution channel error for virtual directory '{name}': {source}")]
    Channel {
        name: String,
        #[source]
        source: ChannelError,
    },
}

impl VirtualDirectoryError {
    /// Name of the resource the error belongs to.
    pub fn resource_name(&self) -> &str {
        match self {
            Self::MissingField { name, .. }
            | Self::InvalidName { name, .. }
            | Self::PhysicalPathNotFound { name, .. }
            | Self::CommandFailed { name, .. }
            | Self::Channel { name, .. } => name,
        }
    }
}
