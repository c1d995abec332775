//! Generic reconciliation framework.
//!
//! This module provides the building blocks for reconciling declared resources
//! against live state through an injected execution channel.
//!
//! # Main Components
//!
//! - [`CommandRunner`] - The execution channel every provider talks through
//! - [`ResourceProvider`] - Trait that resource types implement to be reconciled
//! - [`Reconciler`] - Generic driver: one discovery per pass, sequential dispatch
//! - [`ChannelError`] - Failures of the channel itself
//!
//! # Testing
//!
//! See [`mock`] module for a scripted runner that records every script it receives.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;
