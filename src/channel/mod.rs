//! Concrete [`CommandRunner`](crate::framework::CommandRunner) implementations.

pub mod powershell;

pub use powershell::*;
