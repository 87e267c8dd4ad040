//! Page module
//!
//! The page document the engine is attached to: task entries with their
//! countdown displays and control buttons, and the completed list.

pub mod document;
pub mod seed;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// Re-export main types
pub use document::{CompletedItem, DisplayChange, Element, Page, TaskEntry, COUNTER_PREFIX};
pub use seed::{demo_seeds, load_seeds, TaskSeed};

/// Identifier of a task, unique within the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(TaskId)
    }
}

/// Mode of a task's control button; decides its label and what activation does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Start,
    Stop,
    Completed,
}

impl ControlMode {
    /// Prefix of the button element id in this mode
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ControlMode::Start => "start",
            ControlMode::Stop => "stop",
            ControlMode::Completed => "completed",
        }
    }

    /// Action carried in the button's `name` attribute
    pub fn button_name(&self) -> Option<&'static str> {
        match self {
            ControlMode::Start => Some("start_timer"),
            ControlMode::Stop => Some("stop_timer"),
            ControlMode::Completed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControlMode::Start => "Start",
            ControlMode::Stop => "Stop",
            ControlMode::Completed => "Completed",
        }
    }
}
