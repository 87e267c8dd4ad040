//! Backend notification dispatch task

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::sync::{MarkClient, Notification};

/// Background task posting queued notifications to the backend in order.
///
/// Failures are logged only; the page state has already moved on.
pub async fn notification_dispatch_task(client: MarkClient, mut notifications: mpsc::UnboundedReceiver<Notification>) {
    info!("Starting notification dispatch task for {}", client.endpoint());

    while let Some(notification) = notifications.recv().await {
        match client.mark(&notification).await {
            Ok(()) => debug!(
                "Mirrored {} for task {}",
                notification.name, notification.selected_task
            ),
            Err(e) => warn!("{}", e),
        }
    }

    info!("Notification channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        page::TaskId,
        sync::{SyncNotifier, Transition, MARK_TASK_PATH},
    };
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn failed_notifications_do_not_stop_the_dispatcher() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MARK_TASK_PATH))
            .and(body_string("selected_task=1&name=start_timer"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MARK_TASK_PATH))
            .and(body_string("selected_task=1&name=stop_timer"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (notifier, rx) = SyncNotifier::channel();
        notifier.notify(TaskId(1), Transition::Start);
        notifier.notify(TaskId(1), Transition::Stop);
        drop(notifier);

        let client = MarkClient::new(&server.uri(), None).unwrap();
        notification_dispatch_task(client, rx).await;
    }
}
