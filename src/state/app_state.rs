//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    engine::{ControllerOptions, LifecycleController, LifecycleEvent},
    error::{EngineError, Result},
    page::{ControlMode, Page, TaskId, TaskSeed},
    sync::SyncNotifier,
};

/// Main application state: the page, its lifecycle controller and metadata
#[derive(Debug)]
pub struct AppState {
    /// Page document the engine is attached to
    pub page: Arc<Mutex<Page>>,
    /// Lifecycle state machine; activations and completions take this lock
    pub controller: Arc<Mutex<LifecycleController>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Render the page from seeds and attach a controller to it.
    ///
    /// Returns the receiver of lifecycle events, to be drained by
    /// [`crate::tasks::lifecycle_task`].
    pub fn new(
        port: u16,
        host: String,
        seeds: &[TaskSeed],
        options: ControllerOptions,
        notifier: SyncNotifier,
    ) -> Result<(Self, mpsc::UnboundedReceiver<LifecycleEvent>)> {
        let page = Arc::new(Mutex::new(Page::from_seeds(seeds)));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = LifecycleController::new(Arc::clone(&page), notifier, events_tx, options)?;

        let state = Self {
            page,
            controller: Arc::new(Mutex::new(controller)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        };
        Ok((state, events_rx))
    }

    fn record_action(&self, action: String) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Activate a task's control button
    pub fn activate(&self, task_id: TaskId) -> Result<ControlMode> {
        let mode = self
            .controller
            .lock()
            .map_err(|_| EngineError::StatePoisoned("lifecycle controller"))?
            .activate(task_id)?;

        self.record_action(format!("{} task {}", mode_action(mode), task_id));
        Ok(mode)
    }

    /// Apply a lifecycle event from the engine. Returns whether it changed
    /// any task; only applied events are recorded as the last action.
    pub fn handle_event(&self, event: LifecycleEvent) -> Result<bool> {
        let LifecycleEvent::Completed { task_id, .. } = event;
        let applied = self
            .controller
            .lock()
            .map_err(|_| EngineError::StatePoisoned("lifecycle controller"))?
            .handle_event(event)?;

        if applied {
            self.record_action(format!("complete task {}", task_id));
        }
        Ok(applied)
    }

    /// Current control mode of a task
    pub fn mode(&self, task_id: TaskId) -> Result<Option<ControlMode>> {
        self.controller
            .lock()
            .map(|controller| controller.mode(task_id))
            .map_err(|_| EngineError::StatePoisoned("lifecycle controller"))
    }

    /// Number of running countdowns
    pub fn running_timers(&self) -> Result<usize> {
        self.controller
            .lock()
            .map(|controller| controller.running_timers())
            .map_err(|_| EngineError::StatePoisoned("lifecycle controller"))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Log the page contents the engine is attached to
    pub fn log_page_summary(&self) {
        match self.page.lock() {
            Ok(page) => info!(
                "Page has {} pending tasks ({} timed)",
                page.entries().len(),
                page.counters().count()
            ),
            Err(e) => warn!("Failed to lock page: {}", e),
        }
    }
}

fn mode_action(mode: ControlMode) -> &'static str {
    match mode {
        ControlMode::Stop => "start",
        ControlMode::Start => "stop",
        ControlMode::Completed => "complete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CompletionSource;

    fn state() -> (AppState, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (notifier, _) = SyncNotifier::channel();
        let seeds = vec![TaskSeed {
            id: TaskId(1),
            name: "One".to_string(),
            remaining_time: Some(30),
        }];
        let options = ControllerOptions::default();
        AppState::new(20554, "127.0.0.1".to_string(), &seeds, options, notifier).unwrap()
    }

    #[tokio::test]
    async fn activation_records_last_action() {
        let (state, _events) = state();
        assert_eq!(state.activate(TaskId(1)).unwrap(), ControlMode::Stop);
        assert_eq!(state.running_timers().unwrap(), 1);

        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("start task 1"));
        assert!(time.is_some());

        assert_eq!(state.activate(TaskId(1)).unwrap(), ControlMode::Start);
        assert_eq!(state.get_last_action().0.as_deref(), Some("stop task 1"));
    }

    #[tokio::test]
    async fn rejected_activation_leaves_last_action_alone() {
        let (state, _events) = state();
        assert!(state.activate(TaskId(42)).is_err());
        assert_eq!(state.get_last_action(), (None, None));
    }

    #[test]
    fn ignored_completions_leave_last_action_alone() {
        let (state, _events) = state();
        let unknown = LifecycleEvent::Completed {
            task_id: TaskId(999),
            source: CompletionSource::Display,
        };
        assert!(matches!(state.handle_event(unknown), Err(EngineError::UnknownTask(_))));
        assert_eq!(state.get_last_action(), (None, None));

        let first = LifecycleEvent::Completed {
            task_id: TaskId(1),
            source: CompletionSource::Expiry,
        };
        assert!(state.handle_event(first.clone()).unwrap());
        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("complete task 1"));

        assert!(!state.handle_event(first).unwrap());
        assert_eq!(state.get_last_action(), (action, time));
    }

    #[test]
    fn fresh_state_reports_seconds_uptime() {
        let (state, _events) = state();
        assert!(state.get_uptime().ends_with('s'));
        assert_eq!(state.mode(TaskId(1)).unwrap(), Some(ControlMode::Start));
    }
}
