//! Task Timer - a countdown lifecycle engine for timed tasks
//!
//! This library tracks per-task countdowns on a page document, detects when
//! they reach zero, moves finished tasks to the completed list and mirrors
//! every start, stop and completion to a backend.

pub mod config;
pub mod error;
pub mod engine;
pub mod page;
pub mod sync;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{EngineError, Result};
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
