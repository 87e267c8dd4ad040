//! HTTP client for the backend mark-task endpoint

use std::time::Duration;

use reqwest::{header::COOKIE, Client};
use tracing::debug;

use super::notifier::Notification;
use crate::error::{EngineError, Result};

/// Path of the backend endpoint that records task transitions
pub const MARK_TASK_PATH: &str = "/tracktasks/marktaskcomplete/";

/// Header carrying the CSRF token
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Posts notifications to `{backend}/tracktasks/marktaskcomplete/`
#[derive(Debug, Clone)]
pub struct MarkClient {
    http: Client,
    endpoint: String,
    csrf_token: Option<String>,
}

impl MarkClient {
    /// Create a client with default timeouts
    pub fn new(backend_url: &str, csrf_token: Option<String>) -> Result<Self> {
        Self::with_config(backend_url, csrf_token, ClientConfig::default())
    }

    pub fn with_config(backend_url: &str, csrf_token: Option<String>, config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", backend_url.trim_end_matches('/'), MARK_TASK_PATH),
            csrf_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one notification. The response body is not read.
    pub async fn mark(&self, notification: &Notification) -> Result<()> {
        let mut request = self.http.post(&self.endpoint).form(notification);
        if let Some(token) = &self.csrf_token {
            request = request
                .header(CSRF_HEADER, token)
                .header(COOKIE, format!("csrftoken={}", token));
        }

        let response = request.send().await.map_err(|e| {
            EngineError::NotifyFailed(format!(
                "{} for task {}: {}",
                notification.name, notification.selected_task, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::NotifyFailed(format!(
                "{} for task {}: backend answered {}",
                notification.name, notification.selected_task, status
            )));
        }

        debug!("Backend recorded {} for task {}", notification.name, notification.selected_task);
        Ok(())
    }
}
