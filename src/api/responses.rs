//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::page::{CompletedItem, ControlMode, Element, Page, TaskId};

/// API response structure for button activations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub task_id: TaskId,
    pub mode: Option<ControlMode>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, task_id: TaskId, mode: Option<ControlMode>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            task_id,
            mode,
        }
    }

    /// The activation was applied
    pub fn applied(message: String, task_id: TaskId, mode: ControlMode) -> Self {
        Self::new("ok".to_string(), message, task_id, Some(mode))
    }

    /// The activation was a no-op
    pub fn ignored(message: String, task_id: TaskId, mode: Option<ControlMode>) -> Self {
        Self::new("ignored".to_string(), message, task_id, mode)
    }
}

/// A pending task as rendered on the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTaskView {
    pub task_id: TaskId,
    pub title: String,
    pub display: Option<String>,
    pub button: Option<Element>,
}

/// Snapshot of the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub pending: Vec<PendingTaskView>,
    /// Absent until the first task completes
    pub completed: Option<Vec<CompletedItem>>,
}

impl PageView {
    pub fn from_page(page: &Page) -> Self {
        Self {
            pending: page
                .entries()
                .iter()
                .map(|entry| PendingTaskView {
                    task_id: entry.task_id,
                    title: entry.title.clone(),
                    display: entry.counter.as_ref().map(|c| c.text.clone()),
                    button: entry.button.clone(),
                })
                .collect(),
            completed: page.completed().map(<[CompletedItem]>::to_vec),
        }
    }
}

/// Status response with timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running_timers: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
