//! In-memory page document holding task entries, their countdown displays
//! and control buttons, and the completed list

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use super::{ControlMode, TaskId, TaskSeed};
use crate::engine::duration::format_timedelta;

/// Prefix of countdown display element ids
pub const COUNTER_PREFIX: &str = "time";

/// A rendered element addressed by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    /// `name` attribute; carries the action a button dispatches
    pub name: Option<String>,
    pub text: String,
}

impl Element {
    /// Element for the countdown display of a task
    pub fn counter(task_id: TaskId, text: String) -> Self {
        Self {
            id: format!("{}{}", COUNTER_PREFIX, task_id),
            name: None,
            text,
        }
    }

    /// Control button of a task in the given mode
    pub fn button(task_id: TaskId, mode: ControlMode) -> Self {
        let mut button = Self {
            id: String::new(),
            name: None,
            text: String::new(),
        };
        button.apply_mode(task_id, mode);
        button
    }

    fn apply_mode(&mut self, task_id: TaskId, mode: ControlMode) {
        self.id = format!("{}{}", mode.id_prefix(), task_id);
        self.name = mode.button_name().map(str::to_string);
        self.text = mode.label().to_string();
    }
}

/// A pending task as shown on the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEntry {
    pub task_id: TaskId,
    pub title: String,
    /// Countdown display; absent for untimed tasks
    pub counter: Option<Element>,
    /// Control button; absent for untimed tasks
    pub button: Option<Element>,
}

/// A completed task rendered as a plain list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedItem {
    pub task_id: TaskId,
    pub text: String,
}

/// Notification that a display element's text was re-rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayChange {
    pub element_id: String,
    pub text: String,
}

/// The page document the engine is attached to
#[derive(Debug)]
pub struct Page {
    entries: Vec<TaskEntry>,
    completed: Option<Vec<CompletedItem>>,
    changes: broadcast::Sender<DisplayChange>,
}

impl Page {
    /// Create an empty page
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            entries: Vec::new(),
            completed: None,
            changes,
        }
    }

    /// Render a page from task seeds in the given order
    pub fn from_seeds(seeds: &[TaskSeed]) -> Self {
        let mut page = Self::new();
        for seed in seeds {
            page.add_task(seed);
        }
        page
    }

    /// Append a task entry; timed tasks get a counter and a start button
    pub fn add_task(&mut self, seed: &TaskSeed) {
        let (counter, button) = match seed.remaining_time {
            Some(seconds) => (
                Some(Element::counter(seed.id, format_timedelta(seconds))),
                Some(Element::button(seed.id, ControlMode::Start)),
            ),
            None => (None, None),
        };

        self.entries.push(TaskEntry {
            task_id: seed.id,
            title: seed.name.clone(),
            counter,
            button,
        });
    }

    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    pub fn entry(&self, task_id: TaskId) -> Option<&TaskEntry> {
        self.entries.iter().find(|entry| entry.task_id == task_id)
    }

    fn entry_mut(&mut self, task_id: TaskId) -> Option<&mut TaskEntry> {
        self.entries.iter_mut().find(|entry| entry.task_id == task_id)
    }

    /// All registered countdown display elements
    pub fn counters(&self) -> impl Iterator<Item = &Element> {
        self.entries.iter().filter_map(|entry| entry.counter.as_ref())
    }

    /// All registered control buttons
    pub fn buttons(&self) -> impl Iterator<Item = &Element> {
        self.entries.iter().filter_map(|entry| entry.button.as_ref())
    }

    /// Completed list, `None` until the first completion
    pub fn completed(&self) -> Option<&[CompletedItem]> {
        self.completed.as_deref()
    }

    /// Re-render a task's countdown display.
    ///
    /// Returns false when the task has no counter on the page any more.
    pub fn set_counter_text(&mut self, task_id: TaskId, text: String) -> bool {
        let Some(counter) = self.entry_mut(task_id).and_then(|e| e.counter.as_mut()) else {
            return false;
        };
        counter.text = text;
        let change = DisplayChange {
            element_id: counter.id.clone(),
            text: counter.text.clone(),
        };
        // No observers is the common case
        let _ = self.changes.send(change);
        true
    }

    /// Relabel a task's control button for a new mode
    pub fn set_button_mode(&mut self, task_id: TaskId, mode: ControlMode) -> bool {
        match self.entry_mut(task_id).and_then(|e| e.button.as_mut()) {
            Some(button) => {
                button.apply_mode(task_id, mode);
                true
            }
            None => false,
        }
    }

    /// Move a task into the completed list, newest first.
    ///
    /// The entry loses its counter and button and becomes a plain item.
    pub fn relocate_to_completed(&mut self, task_id: TaskId) -> Option<&CompletedItem> {
        let position = self.entries.iter().position(|e| e.task_id == task_id)?;
        let entry = self.entries.remove(position);

        let text = match entry.counter {
            Some(counter) => format!("{} ({})", entry.title, counter.text),
            None => entry.title,
        };

        let completed = self.completed.get_or_insert_with(|| {
            debug!("Creating completed list");
            Vec::new()
        });
        completed.insert(0, CompletedItem { task_id, text });
        completed.first()
    }

    /// Observe display re-renders
    pub fn subscribe_changes(&self) -> broadcast::Receiver<DisplayChange> {
        self.changes.subscribe()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
