//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{engine::ControllerOptions, sync::MARK_TASK_PATH};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "task-timer")]
#[command(about = "Countdown lifecycle engine for timed tasks")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Base URL of the backend that mirrors task transitions
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    pub backend_url: String,

    /// CSRF token sent with every backend notification
    #[arg(long, env = "CSRF_TOKEN")]
    pub csrf_token: Option<String>,

    /// JSON file with the tasks to put on the page
    #[arg(short, long)]
    pub tasks: Option<PathBuf>,

    /// Countdown tick interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    pub granularity_ms: u64,

    /// Also detect completion from rendered display text
    #[arg(long)]
    pub observe_display: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn granularity(&self) -> Duration {
        Duration::from_millis(self.granularity_ms)
    }

    /// Full URL of the mark-task endpoint
    pub fn mark_endpoint(&self) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), MARK_TASK_PATH)
    }

    /// Options for the lifecycle controller
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            granularity: self.granularity(),
            observe_display: self.observe_display,
        }
    }
}
