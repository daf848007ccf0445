use std::time::Duration;

use thiserror::Error;

/// Default ingestion endpoint of Swetrix cloud.
pub const DEFAULT_API_URL: &str = "https://api.swetrix.com/log";

/// Time between two heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Configuration rejected at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("[swetrix] Project ID cannot be empty")]
    EmptyProjectId,
    #[error("[swetrix] API URL cannot be empty")]
    EmptyApiUrl,
}

/// Immutable client configuration.
///
/// The `with_*` methods never touch `self`; each returns a new value with a
/// single field overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    project_id: String,
    api_url: String,
    debug_enabled: bool,
    analytics_disabled: bool,
    heartbeat_interval: Duration,
}

impl Config {
    /// Create a config for `project_id`; all other fields use defaults.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
            debug_enabled: false,
            analytics_disabled: false,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_debug_enabled(&self, debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            ..self.clone()
        }
    }

    pub fn with_analytics_disabled(&self, analytics_disabled: bool) -> Self {
        Self {
            analytics_disabled,
            ..self.clone()
        }
    }

    /// Point the client at a self-hosted deployment.
    pub fn with_api_url(&self, api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..self.clone()
        }
    }

    pub fn with_heartbeat_interval(&self, heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            ..self.clone()
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn analytics_disabled(&self) -> bool {
        self.analytics_disabled
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Check the fields a client cannot work without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        if self.project_id.is_empty() {
            return Err(ConfigError::EmptyProjectId);
        }
        Ok(())
    }

    /// Join `path` onto the API URL. An empty path yields the page-view
    /// endpoint itself.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}
