//! Configuration for the worker.
//!
//! The worker takes no command line - it is spawned by the orchestrator
//! with the control channel on stdin - so everything comes from the
//! environment.

use std::env;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Optional boot log file path.
    pub log_path: Option<String>,

    /// Whether the control channel arrives base64-encoded.
    pub stdin_base64: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let log_level = env::var("WARDEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_path = env::var("WARDEN_LOG_PATH").ok().filter(|p| !p.is_empty());

        let stdin_base64 = env::var("WARDEN_STDIN_BASE64")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            log_level,
            log_path,
            stdin_base64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_path: None,
            stdin_base64: false,
        }
    }
}
