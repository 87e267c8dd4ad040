//! Task Timer - a countdown lifecycle engine for timed tasks
//!
//! This is the main entry point for the task-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use task_timer::{
    api::create_router,
    config::Config,
    page::{demo_seeds, load_seeds},
    state::AppState,
    sync::{MarkClient, SyncNotifier},
    tasks::{lifecycle_task, notification_dispatch_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("task_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting task-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, backend={}, granularity={}ms",
          config.host, config.port, config.mark_endpoint(), config.granularity_ms);

    let seeds = match &config.tasks {
        Some(path) => load_seeds(path)?,
        None => {
            info!("No task file given, using demo tasks");
            demo_seeds()
        }
    };

    // Backend mirroring runs on its own task so transitions never wait on it
    let client = MarkClient::new(&config.backend_url, config.csrf_token.clone())?;
    let (notifier, notifications) = SyncNotifier::channel();
    tokio::spawn(notification_dispatch_task(client, notifications));

    // Create application state
    let (state, events) = AppState::new(
        config.port,
        config.host.clone(),
        &seeds,
        config.controller_options(),
        notifier,
    )?;
    let state = Arc::new(state);
    state.log_page_summary();

    // Start the lifecycle background task
    tokio::spawn(lifecycle_task(Arc::clone(&state), events));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /tasks                   - Page snapshot");
    info!("  POST /tasks/:task_id/activate - Press a task's start/stop button");
    info!("  GET  /status                  - Running timers and last action");
    info!("  GET  /health                  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
