//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod lifecycle_loop;
pub mod notify_dispatch;

// Re-export main functions
pub use lifecycle_loop::lifecycle_task;
pub use notify_dispatch::notification_dispatch_task;
