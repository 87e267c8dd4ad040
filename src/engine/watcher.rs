//! Completion watcher: turns a countdown reaching zero into exactly one
//! completion event per timer run

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::{
    sync::{broadcast, broadcast::error::RecvError, mpsc, Notify},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::{
    countdown::CountdownTimer,
    duration::parse_to_seconds,
    lifecycle::{CompletionSource, LifecycleEvent},
};
use crate::page::{DisplayChange, TaskId, COUNTER_PREFIX};

/// True when rendered countdown text reads zero (`00s`, `0s`, ...)
pub fn is_zero_text(text: &str) -> bool {
    matches!(parse_to_seconds(text), Ok(0))
}

/// Watches one timer run of a task and emits its completion once.
///
/// Clones share the fired state, so the zero tick, the expiry notification
/// and the display observer together still produce a single event.
#[derive(Debug, Clone)]
pub struct CompletionWatcher {
    task_id: TaskId,
    detached: Arc<AtomicBool>,
    disarmed: Arc<Notify>,
    events: mpsc::UnboundedSender<LifecycleEvent>,
}

impl CompletionWatcher {
    /// Create an armed watcher for a task
    pub fn new(task_id: TaskId, events: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        Self {
            task_id,
            detached: Arc::new(AtomicBool::new(false)),
            disarmed: Arc::new(Notify::new()),
            events,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Whether the watcher has fired or was disarmed
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Emit the completion event unless already fired. Returns whether this
    /// call fired.
    pub fn fire(&self, source: CompletionSource) -> bool {
        if self.detached.swap(true, Ordering::SeqCst) {
            debug!("Watcher for task {} already detached, ignoring {:?}", self.task_id, source);
            return false;
        }

        info!("Task {} reached zero ({:?})", self.task_id, source);
        let event = LifecycleEvent::Completed {
            task_id: self.task_id,
            source,
        };
        if let Err(e) = self.events.send(event) {
            warn!("Failed to send completion of task {}: {}", self.task_id, e);
        }
        true
    }

    /// Detach without firing
    pub fn disarm(&self) {
        if !self.detached.swap(true, Ordering::SeqCst) {
            debug!("Watcher for task {} disarmed", self.task_id);
        }
        self.disarmed.notify_one();
    }

    /// Subscribe to a timer's zero tick and expiry notification
    pub fn arm_on(&self, timer: &CountdownTimer) {
        let on_zero = self.clone();
        timer.on_tick(move |tick| {
            if tick.display.is_zero() {
                on_zero.fire(CompletionSource::ZeroTick);
            }
        });

        let on_expiry = self.clone();
        timer.on_expire(move || {
            on_expiry.fire(CompletionSource::Expiry);
        });
    }

    /// Fallback for displays not driven through tick subscribers: watch the
    /// page's display changes for this task's counter reading zero.
    pub fn observe_display(&self, mut changes: broadcast::Receiver<DisplayChange>) -> JoinHandle<()> {
        let watcher = self.clone();
        let element_id = format!("{}{}", COUNTER_PREFIX, self.task_id);

        tokio::spawn(async move {
            while !watcher.is_detached() {
                tokio::select! {
                    _ = watcher.disarmed.notified() => break,
                    change = changes.recv() => match change {
                        Ok(change) => {
                            if change.element_id == element_id && is_zero_text(&change.text) {
                                watcher.fire(CompletionSource::Display);
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Display observer for {} skipped {} changes", element_id, skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Display observer for {} detached", element_id);
        })
    }
}
