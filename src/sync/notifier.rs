//! Fire-and-forget notifier for lifecycle transitions

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::page::TaskId;

/// A task's control-state change, as mirrored to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Start,
    Stop,
    Complete,
}

impl Transition {
    /// Value sent as the `name` field
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Start => "start_timer",
            Transition::Stop => "stop_timer",
            Transition::Complete => "complete_task",
        }
    }
}

/// Form body of a mark request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub selected_task: TaskId,
    pub name: &'static str,
}

impl Notification {
    pub fn new(task_id: TaskId, transition: Transition) -> Self {
        Self {
            selected_task: task_id,
            name: transition.name(),
        }
    }
}

/// Queues notifications for the dispatch task without waiting on the network
#[derive(Debug, Clone)]
pub struct SyncNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl SyncNotifier {
    /// Create a notifier and the receiving end the dispatcher drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a transition for mirroring. Never fails the caller.
    pub fn notify(&self, task_id: TaskId, transition: Transition) {
        let notification = Notification::new(task_id, transition);
        debug!("Queueing {} for task {}", notification.name, task_id);

        if let Err(e) = self.tx.send(notification) {
            warn!("Sync dispatcher is gone, dropping {} for task {}", e.0.name, task_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_use_button_names() {
        assert_eq!(Transition::Start.name(), "start_timer");
        assert_eq!(Transition::Stop.name(), "stop_timer");
        assert_eq!(Transition::Complete.name(), "complete_task");
    }

    #[test]
    fn notify_queues_in_order() {
        let (notifier, mut rx) = SyncNotifier::channel();
        notifier.notify(TaskId(62), Transition::Start);
        notifier.notify(TaskId(62), Transition::Stop);

        assert_eq!(rx.try_recv().unwrap(), Notification::new(TaskId(62), Transition::Start));
        assert_eq!(rx.try_recv().unwrap().name, "stop_timer");
    }

    #[test]
    fn notify_without_dispatcher_does_not_fail() {
        let (notifier, rx) = SyncNotifier::channel();
        drop(rx);
        notifier.notify(TaskId(1), Transition::Complete);
    }
}
