//! Utility functions module
//!
//! Process-level helpers for the server binary, currently shutdown signal handling.

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
