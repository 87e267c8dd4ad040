//! Backend synchronization module
//!
//! Mirrors lifecycle transitions to the backend on a best-effort basis.
//! Local state never waits on, or rolls back because of, the backend.

pub mod client;
pub mod notifier;

// Re-export main types
pub use client::{ClientConfig, MarkClient, MARK_TASK_PATH};
pub use notifier::{Notification, SyncNotifier, Transition};
