//! Lifecycle event background task

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{engine::LifecycleEvent, state::AppState};

/// Background task applying completion events to the lifecycle controller,
/// one at a time, until every sender is gone
pub async fn lifecycle_task(
    state: Arc<AppState>,
    mut events: mpsc::UnboundedReceiver<LifecycleEvent>,
) {
    info!("Starting lifecycle task");

    while let Some(event) = events.recv().await {
        debug!("Lifecycle task received {:?}", event);
        match state.handle_event(event) {
            Ok(true) => {}
            Ok(false) => debug!("Lifecycle event changed nothing"),
            Err(e) => warn!("Failed to apply lifecycle event: {}", e),
        }
    }

    info!("Lifecycle event channel closed");
}
