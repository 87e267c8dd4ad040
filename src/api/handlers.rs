//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{error::EngineError, page::TaskId, state::AppState};
use super::responses::{ApiResponse, HealthResponse, PageView, StatusResponse};

/// Handle POST /tasks/:task_id/activate - press a task's control button
pub async fn activate_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u64>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let task_id = TaskId(task_id);

    match state.activate(task_id) {
        Ok(mode) => {
            info!("Task {} activated, button now {}", task_id, mode.label());
            Ok(Json(ApiResponse::applied(
                format!("Task {} button is now {}", task_id, mode.label()),
                task_id,
                mode,
            )))
        }
        Err(e) if e.is_benign() => {
            // Stale buttons are expected, e.g. after the counter moved to the completed list
            let mode = state.mode(task_id).ok().flatten();
            Ok(Json(ApiResponse::ignored(e.to_string(), task_id, mode)))
        }
        Err(EngineError::UnknownTask(_)) => {
            warn!("Activation of unknown task {}", task_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(EngineError::TaskCompleted(_)) => Err(StatusCode::CONFLICT),
        Err(e @ EngineError::InvalidDuration(_)) => {
            warn!("Task {} has an unreadable counter: {}", task_id, e);
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => {
            error!("Failed to activate task {}: {}", task_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /tasks - return the page snapshot
pub async fn tasks_handler(State(state): State<Arc<AppState>>) -> Result<Json<PageView>, StatusCode> {
    match state.page.lock() {
        Ok(page) => Ok(Json(PageView::from_page(&page))),
        Err(e) => {
            error!("Failed to lock page: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current engine status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let running_timers = match state.running_timers() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count running timers: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (pending_tasks, completed_tasks) = match state.page.lock() {
        Ok(page) => (page.entries().len(), page.completed().map_or(0, |c| c.len())),
        Err(e) => {
            error!("Failed to lock page: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        running_timers,
        pending_tasks,
        completed_tasks,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
