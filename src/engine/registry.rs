//! Lookup of a task's countdown display and control button on the page

use tracing::debug;

use super::duration::parse_to_seconds;
use crate::{
    error::{EngineError, Result},
    page::{ControlMode, Element, Page, TaskId},
};

/// A countdown display matched to a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterMatch {
    pub element: Element,
    pub task_id: TaskId,
    /// Remaining time decoded from the rendered text
    pub remaining_seconds: u64,
}

/// Task id encoded in an element id: everything after the leading non-digits
fn id_suffix(element_id: &str) -> Option<TaskId> {
    element_id
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()
}

/// Resolve the countdown display of a task and decode its remaining time
pub fn find_counter(page: &Page, task_id: TaskId) -> Result<CounterMatch> {
    let element = page
        .counters()
        .find(|counter| id_suffix(&counter.id) == Some(task_id))
        .ok_or(EngineError::CounterNotFound(task_id))?;

    let remaining_seconds = parse_to_seconds(&element.text)?;
    debug!("Found counter {} with {}s remaining", element.id, remaining_seconds);

    Ok(CounterMatch {
        element: element.clone(),
        task_id,
        remaining_seconds,
    })
}

/// Resolve the control button of a task that is currently in `mode`
pub fn find_button(page: &Page, task_id: TaskId, mode: ControlMode) -> Result<Element> {
    page.buttons()
        .filter(|button| button.id.starts_with(mode.id_prefix()))
        .find(|button| id_suffix(&button.id) == Some(task_id))
        .cloned()
        .ok_or(EngineError::ButtonNotFound {
            task_id,
            mode: mode.id_prefix(),
        })
}
