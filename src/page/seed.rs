//! Task seeds the page is rendered from

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::TaskId;
use crate::error::{EngineError, Result};

/// A task as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSeed {
    pub id: TaskId,
    pub name: String,
    /// Remaining timed duration in seconds; untimed tasks leave it out
    #[serde(default)]
    pub remaining_time: Option<u64>,
}

/// Load task seeds from a JSON array file
pub fn load_seeds(path: &Path) -> Result<Vec<TaskSeed>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Seed(format!("{}: {}", path.display(), e)))?;
    let seeds: Vec<TaskSeed> = serde_json::from_str(&raw)
        .map_err(|e| EngineError::Seed(format!("{}: {}", path.display(), e)))?;

    info!("Loaded {} tasks from {}", seeds.len(), path.display());
    Ok(seeds)
}

/// Tasks shown when no seed file is configured
pub fn demo_seeds() -> Vec<TaskSeed> {
    vec![
        TaskSeed {
            id: TaskId(62),
            name: "Write weekly report".to_string(),
            remaining_time: Some(120),
        },
        TaskSeed {
            id: TaskId(63),
            name: "Deep work block".to_string(),
            remaining_time: Some(25 * 60),
        },
        TaskSeed {
            id: TaskId(64),
            name: "Water the plants".to_string(),
            remaining_time: None,
        },
    ]
}
