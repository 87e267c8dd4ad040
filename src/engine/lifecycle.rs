//! Task lifecycle controller: the start/stop/completed state machine

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    countdown::{CountdownTimer, TimerStatus, DEFAULT_GRANULARITY},
    duration::DisplayDuration,
    registry::find_counter,
    watcher::CompletionWatcher,
};
use crate::{
    error::{EngineError, Result},
    page::{ControlMode, Page, TaskId},
    sync::{SyncNotifier, Transition},
};

/// What detected that a countdown reached zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSource {
    ZeroTick,
    Expiry,
    Display,
}

/// Events delivered to the controller from timers and watchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Completed { task_id: TaskId, source: CompletionSource },
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Tick interval of the countdown timers
    pub granularity: Duration,
    /// Also watch rendered display text for the zero form
    pub observe_display: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            observe_display: false,
        }
    }
}

/// Drives each task's control button through start, stop and completion,
/// owning one countdown timer per running task.
#[derive(Debug)]
pub struct LifecycleController {
    page: Arc<Mutex<Page>>,
    /// Source of truth for what each task's button does next
    modes: HashMap<TaskId, ControlMode>,
    timers: HashMap<TaskId, CountdownTimer>,
    watchers: HashMap<TaskId, CompletionWatcher>,
    events: mpsc::UnboundedSender<LifecycleEvent>,
    notifier: SyncNotifier,
    options: ControllerOptions,
}

fn lock_page(page: &Mutex<Page>) -> Result<MutexGuard<'_, Page>> {
    page.lock().map_err(|_| EngineError::StatePoisoned("page"))
}

impl LifecycleController {
    /// Attach to a page; every task with a control button starts in `Start` mode
    pub fn new(
        page: Arc<Mutex<Page>>,
        notifier: SyncNotifier,
        events: mpsc::UnboundedSender<LifecycleEvent>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let modes = lock_page(&page)?
            .entries()
            .iter()
            .filter(|entry| entry.button.is_some())
            .map(|entry| (entry.task_id, ControlMode::Start))
            .collect();

        Ok(Self {
            page,
            modes,
            timers: HashMap::new(),
            watchers: HashMap::new(),
            events,
            notifier,
            options,
        })
    }

    pub fn page(&self) -> Arc<Mutex<Page>> {
        Arc::clone(&self.page)
    }

    /// Current control mode of a task
    pub fn mode(&self, task_id: TaskId) -> Option<ControlMode> {
        self.modes.get(&task_id).copied()
    }

    pub fn timer_status(&self, task_id: TaskId) -> Option<TimerStatus> {
        self.timers.get(&task_id).map(CountdownTimer::status)
    }

    /// Number of tasks whose countdown is running
    pub fn running_timers(&self) -> usize {
        self.timers.values().filter(|timer| timer.is_running()).count()
    }

    /// Handle a button activation. Returns the task's new mode.
    pub fn activate(&mut self, task_id: TaskId) -> Result<ControlMode> {
        let result = match self.mode(task_id) {
            None => Err(EngineError::UnknownTask(task_id)),
            Some(ControlMode::Completed) => Err(EngineError::TaskCompleted(task_id)),
            Some(ControlMode::Start) => self.start_task(task_id),
            Some(ControlMode::Stop) => self.stop_task(task_id),
        };

        if let Err(e) = &result {
            if e.is_benign() {
                warn!("Ignoring activation of task {}: {}", task_id, e);
            } else {
                debug!("Activation of task {} rejected: {}", task_id, e);
            }
        }
        result
    }

    fn start_task(&mut self, task_id: TaskId) -> Result<ControlMode> {
        let counter = find_counter(&*lock_page(&self.page)?, task_id)?;
        let remaining = counter.remaining_seconds;

        let timer = CountdownTimer::with_granularity(remaining, self.options.granularity);
        let page = Arc::clone(&self.page);
        timer.on_tick(move |tick| match page.lock() {
            Ok(mut page) => {
                page.set_counter_text(task_id, tick.display.to_string());
            }
            Err(_) => warn!("Page lock poisoned, dropping tick for task {}", task_id),
        });

        let watcher = CompletionWatcher::new(task_id, self.events.clone());
        watcher.arm_on(&timer);

        {
            let mut page = lock_page(&self.page)?;
            if self.options.observe_display {
                watcher.observe_display(page.subscribe_changes());
            }
            page.set_counter_text(task_id, DisplayDuration::from_secs(remaining).to_string());
            page.set_button_mode(task_id, ControlMode::Stop);
        }

        timer.start()?;
        if let Some(previous) = self.timers.insert(task_id, timer) {
            previous.stop();
        }
        if let Some(previous) = self.watchers.insert(task_id, watcher) {
            previous.disarm();
        }

        self.modes.insert(task_id, ControlMode::Stop);
        info!("Task {} started with {}s remaining", task_id, remaining);
        self.notifier.notify(task_id, Transition::Start);
        Ok(ControlMode::Stop)
    }

    fn stop_task(&mut self, task_id: TaskId) -> Result<ControlMode> {
        self.discard_run(task_id);
        lock_page(&self.page)?.set_button_mode(task_id, ControlMode::Start);

        self.modes.insert(task_id, ControlMode::Start);
        info!("Task {} stopped", task_id);
        self.notifier.notify(task_id, Transition::Stop);
        Ok(ControlMode::Start)
    }

    fn discard_run(&mut self, task_id: TaskId) {
        if let Some(timer) = self.timers.remove(&task_id) {
            timer.stop();
        }
        if let Some(watcher) = self.watchers.remove(&task_id) {
            watcher.disarm();
        }
    }

    /// Complete a task: move it to the completed list and mirror it.
    /// Relocation strips the entry's counter and button, so there is no
    /// button left to relabel. Returns false when the task was already
    /// completed.
    pub fn complete(&mut self, task_id: TaskId, source: CompletionSource) -> Result<bool> {
        match self.mode(task_id) {
            None => return Err(EngineError::UnknownTask(task_id)),
            Some(ControlMode::Completed) => {
                debug!("Task {} already completed, ignoring {:?}", task_id, source);
                return Ok(false);
            }
            Some(_) => {}
        }

        self.discard_run(task_id);
        {
            let mut page = lock_page(&self.page)?;
            if page.relocate_to_completed(task_id).is_none() {
                warn!("Task {} had no entry to relocate", task_id);
            }
        }

        self.modes.insert(task_id, ControlMode::Completed);
        info!("Task {} completed ({:?})", task_id, source);
        self.notifier.notify(task_id, Transition::Complete);
        Ok(true)
    }

    /// Apply an event from a timer or watcher. Returns whether it changed
    /// any task; duplicate completions yield `Ok(false)`.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> Result<bool> {
        match event {
            LifecycleEvent::Completed { task_id, source } => self.complete(task_id, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{page::TaskSeed, sync::Notification};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::error::TryRecvError;

    struct Harness {
        controller: LifecycleController,
        events: mpsc::UnboundedReceiver<LifecycleEvent>,
        notifications: mpsc::UnboundedReceiver<Notification>,
    }

    fn harness(seeds: &[TaskSeed]) -> Harness {
        let page = Arc::new(Mutex::new(Page::from_seeds(seeds)));
        let (notifier, notifications) = SyncNotifier::channel();
        let (tx, events) = mpsc::unbounded_channel();
        let controller =
            LifecycleController::new(page, notifier, tx, ControllerOptions::default()).unwrap();
        Harness { controller, events, notifications }
    }

    fn timed(id: u64, seconds: u64) -> TaskSeed {
        TaskSeed { id: TaskId(id), name: format!("Task {}", id), remaining_time: Some(seconds) }
    }

    fn counter_text(controller: &LifecycleController, task_id: TaskId) -> Option<String> {
        let page = controller.page();
        let page = page.lock().unwrap();
        page.entry(task_id).and_then(|e| e.counter.as_ref()).map(|c| c.text.clone())
    }

    fn sent(notifications: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(n) = notifications.try_recv() {
            names.push(n.name);
        }
        names
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_stop_toggles_mode_and_keeps_remaining_time() {
        let mut h = harness(&[timed(3, 10)]);

        assert_eq!(h.controller.activate(TaskId(3)).unwrap(), ControlMode::Stop);
        assert_eq!(counter_text(&h.controller, TaskId(3)).as_deref(), Some("10s"));
        assert_eq!(h.controller.running_timers(), 1);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(counter_text(&h.controller, TaskId(3)).as_deref(), Some("07s"));

        assert_eq!(h.controller.activate(TaskId(3)).unwrap(), ControlMode::Start);
        assert_eq!(h.controller.running_timers(), 0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter_text(&h.controller, TaskId(3)).as_deref(), Some("07s"));

        // Restart resumes from the displayed time
        h.controller.activate(TaskId(3)).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(counter_text(&h.controller, TaskId(3)).as_deref(), Some("06s"));

        assert_eq!(sent(&mut h.notifications), vec!["start_timer", "stop_timer", "start_timer"]);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_completes_task_once() {
        let mut h = harness(&[timed(8, 2), timed(9, 60)]);
        h.controller.activate(TaskId(8)).unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        let event = h.events.try_recv().unwrap();
        assert_eq!(
            event,
            LifecycleEvent::Completed { task_id: TaskId(8), source: CompletionSource::ZeroTick }
        );
        assert_eq!(h.events.try_recv(), Err(TryRecvError::Empty));

        assert!(h.controller.handle_event(event.clone()).unwrap());
        assert_eq!(h.controller.mode(TaskId(8)), Some(ControlMode::Completed));
        assert!(!h.controller.handle_event(event).unwrap());
        assert!(!h.controller.complete(TaskId(8), CompletionSource::Expiry).unwrap());

        let page = h.controller.page();
        let page = page.lock().unwrap();
        let completed = page.completed().unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].text, "Task 8 (00s)");
        assert!(page.entry(TaskId(8)).is_none());
        assert!(page.entry(TaskId(9)).is_some());
        drop(page);

        assert_eq!(sent(&mut h.notifications), vec!["start_timer", "complete_task"]);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_task_rejects_activation() {
        let mut h = harness(&[timed(8, 1)]);
        h.controller.activate(TaskId(8)).unwrap();
        h.controller.complete(TaskId(8), CompletionSource::Expiry).unwrap();

        assert!(matches!(
            h.controller.activate(TaskId(8)),
            Err(EngineError::TaskCompleted(TaskId(8)))
        ));
        assert_eq!(h.controller.timer_status(TaskId(8)), None);
    }

    #[tokio::test]
    async fn unknown_and_untimed_tasks_are_rejected() {
        let mut h = harness(&[TaskSeed {
            id: TaskId(1),
            name: "Untimed".to_string(),
            remaining_time: None,
        }]);
        assert!(matches!(h.controller.activate(TaskId(1)), Err(EngineError::UnknownTask(_))));
        assert!(matches!(h.controller.activate(TaskId(2)), Err(EngineError::UnknownTask(_))));
        assert!(sent(&mut h.notifications).is_empty());
    }

    #[test]
    fn completion_of_unknown_task_is_an_error() {
        let mut h = harness(&[timed(1, 30)]);
        let event = LifecycleEvent::Completed {
            task_id: TaskId(999),
            source: CompletionSource::Display,
        };
        assert!(matches!(
            h.controller.handle_event(event),
            Err(EngineError::UnknownTask(TaskId(999)))
        ));
        assert!(h.controller.page().lock().unwrap().completed().is_none());
        assert!(sent(&mut h.notifications).is_empty());
    }

    #[tokio::test]
    async fn missing_counter_is_a_benign_no_op() {
        let mut h = harness(&[timed(5, 30)]);
        h.controller.page().lock().unwrap().relocate_to_completed(TaskId(5));

        let err = h.controller.activate(TaskId(5)).unwrap_err();
        assert!(err.is_benign());
        assert_eq!(h.controller.mode(TaskId(5)), Some(ControlMode::Start));
        assert!(sent(&mut h.notifications).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn tasks_count_down_independently() {
        let mut h = harness(&[timed(1, 5), timed(2, 10)]);
        h.controller.activate(TaskId(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        h.controller.activate(TaskId(2)).unwrap();
        assert_eq!(h.controller.running_timers(), 2);

        // t = 3.7s: task 1 ticked at 3s, task 2 at 3.5s
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(counter_text(&h.controller, TaskId(1)).as_deref(), Some("02s"));
        assert_eq!(counter_text(&h.controller, TaskId(2)).as_deref(), Some("09s"));

        // t = 4.7s: only task 1 keeps ticking
        h.controller.activate(TaskId(2)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter_text(&h.controller, TaskId(1)).as_deref(), Some("01s"));
        assert_eq!(counter_text(&h.controller, TaskId(2)).as_deref(), Some("09s"));
        assert_eq!(h.controller.timer_status(TaskId(1)), Some(TimerStatus::Running));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_run_never_completes() {
        let mut h = harness(&[timed(4, 2)]);
        h.controller.activate(TaskId(4)).unwrap();
        h.controller.activate(TaskId(4)).unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.events.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(h.controller.mode(TaskId(4)), Some(ControlMode::Start));
    }
}
