//! Pure data structures: what the caller declares and what discovery reports.

pub mod virtual_directory;

pub use virtual_directory::*;
