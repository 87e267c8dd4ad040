//! Task timer engine
//!
//! Duration codec, countdown timers, page lookups, completion watching and
//! the per-task lifecycle state machine.

pub mod countdown;
pub mod duration;
pub mod lifecycle;
pub mod registry;
pub mod watcher;

// Re-export main types
pub use countdown::{CountdownTimer, Tick, TimerStatus, DEFAULT_GRANULARITY};
pub use duration::{format_timedelta, parse_to_seconds, seconds_to_display, DisplayDuration};
pub use lifecycle::{CompletionSource, ControllerOptions, LifecycleController, LifecycleEvent};
pub use registry::{find_button, find_counter, CounterMatch};
pub use watcher::CompletionWatcher;
