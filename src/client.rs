use crate::config::{Config, ConfigError};
use crate::environment;
use crate::heartbeat::HeartbeatTask;
use crate::transport::{HttpTransport, Transport, TransportError};
use crate::types::{ApiErrorEnvelope, CustomEvent, Heartbeat, PageView};

use log::{debug, error, warn};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const CUSTOM_PATH: &str = "custom";
const HEARTBEAT_PATH: &str = "hb";

/// How an error envelope about an already-counted unique event is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collisions {
    Tolerate,
    Report,
}

/// State shared between the client and its heartbeat thread.
struct Shared {
    config: Config,
    transport: Box<dyn Transport>,
    // Prefix of every log line, e.g. `[swetrix:abc123]`
    tag: String,
}

impl Shared {
    fn post<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Option<ApiErrorEnvelope>, TransportError> {
        let body = serde_json::to_value(payload)?;
        let reply = self.transport.post(&self.config.endpoint(path), &body)?;
        match reply {
            None => Ok(None),
            Some(map) => Ok(Some(serde_json::from_value(Value::Object(map))?)),
        }
    }

    /// Send one request and log the outcome. Never fails.
    fn send<T: Serialize>(&self, what: &str, path: &str, payload: &T, collisions: Collisions) {
        match self.post(path, payload) {
            Ok(None) => {
                if self.config.debug_enabled() {
                    debug!("{} Successfully sent {what}", self.tag);
                }
            }
            Ok(Some(envelope))
                if collisions == Collisions::Tolerate && envelope.is_unique_collision() =>
            {
                warn!("{} Already tracked unique {what} for session", self.tag);
            }
            Ok(Some(envelope)) => {
                error!(
                    "{} An API error occurred while sending {what}:\n{}: {}",
                    self.tag, envelope.error, envelope.message
                );
            }
            Err(e) => {
                error!(
                    "{} An error occurred whilst making API call for {what}:\n{e}",
                    self.tag
                );
            }
        }
    }

    /// Returns true (after logging) when analytics are disabled.
    fn skip_disabled(&self, what: &str) -> bool {
        if !self.config.analytics_disabled() {
            return false;
        }
        if self.config.debug_enabled() {
            debug!("{} Analytics are disabled, not sending {what}", self.tag);
        }
        true
    }

    fn beat(&self) {
        if self.skip_disabled("heartbeat") {
            return;
        }
        let payload = Heartbeat {
            pid: self.config.project_id(),
        };
        self.send("heartbeat", HEARTBEAT_PATH, &payload, Collisions::Report);
    }
}

/// Swetrix analytics client.
///
/// Every tracking call issues one blocking POST and logs the result through
/// the `log` facade. Failures never reach the caller.
///
/// The heartbeat runs on its own thread; at most one is active per client.
pub struct Swetrix {
    shared: Arc<Shared>,
    session_started: AtomicBool,
    heartbeat: Mutex<Option<HeartbeatTask>>,
}

impl Swetrix {
    /// Create a client for `project_id` with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if `project_id` is empty.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::builder(project_id).build()
    }

    pub fn builder(project_id: impl Into<String>) -> Builder {
        Builder::new(project_id)
    }

    fn from_parts(config: Config, transport: Box<dyn Transport>) -> Self {
        let tag = format!("[swetrix:{}]", config.project_id());
        if config.debug_enabled() {
            debug!("{tag} Debug mode enabled! Using config: {config:?}");
        }

        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                tag,
            }),
            session_started: AtomicBool::new(false),
            heartbeat: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Whether a page view has been tracked by this client.
    pub fn has_started_session(&self) -> bool {
        self.session_started.load(Ordering::SeqCst)
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.heartbeat
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Track a custom event.
    ///
    /// `event` must be non-empty and consist of ASCII letters, digits and
    /// underscores. A unique event is only counted once per session; repeats
    /// are logged as warnings.
    pub fn track(&self, event: &str, unique: bool) {
        debug_assert!(
            self.has_started_session(),
            "[swetrix] track() called before any page view was tracked"
        );

        let what = format!("event \"{event}\" (unique: {unique})");
        if self.shared.skip_disabled(&what) {
            return;
        }

        let payload = CustomEvent {
            pid: self.shared.config.project_id(),
            ev: event,
            unique,
        };
        self.shared
            .send(&what, CUSTOM_PATH, &payload, Collisions::Tolerate);
    }

    /// Track a page view using the host locale.
    pub fn track_page_view(&self, page: &str) {
        self.track_page_view_with_locale(page, environment::locale());
    }

    /// Track a page view. Starts the session even when analytics are
    /// disabled.
    pub fn track_page_view_with_locale(&self, page: &str, locale: &str) {
        self.session_started.store(true, Ordering::SeqCst);

        let what = format!("page view \"{page}\"");
        if self.shared.skip_disabled(&what) {
            return;
        }

        let tz = environment::time_zone();
        let payload = PageView {
            pid: self.shared.config.project_id(),
            pg: page,
            tz: &tz,
            lc: locale,
            unique: false,
        };
        self.shared.send(&what, "", &payload, Collisions::Report);
    }

    /// Start sending heartbeats on a background thread. No-op when one is
    /// already running.
    ///
    /// # Panics
    ///
    /// Panics if no page view has been tracked yet.
    pub fn start_heartbeat(&self) {
        assert!(
            self.has_started_session(),
            "[swetrix] start_heartbeat() called before any page view was tracked"
        );

        let mut slot = self.heartbeat.lock().unwrap();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            if self.shared.config.debug_enabled() {
                debug!("{} Heartbeat already running", self.shared.tag);
            }
            return;
        }

        let shared = Arc::clone(&self.shared);
        match HeartbeatTask::spawn(self.shared.config.heartbeat_interval(), move || {
            shared.beat()
        }) {
            Ok(task) => {
                *slot = Some(task);
                if self.shared.config.debug_enabled() {
                    debug!("{} Heartbeat started", self.shared.tag);
                }
            }
            Err(e) => {
                *slot = None;
                error!("{} Failed to spawn heartbeat thread: {e}", self.shared.tag);
            }
        }
    }

    /// Stop the heartbeat, if any. A later `start_heartbeat` spawns a fresh
    /// thread.
    pub fn stop_heartbeat(&self) {
        let task = self.heartbeat.lock().unwrap().take();
        if let Some(task) = task {
            task.cancel();
            if self.shared.config.debug_enabled() {
                debug!("{} Heartbeat stopped", self.shared.tag);
            }
        }
    }
}

impl Drop for Swetrix {
    fn drop(&mut self) {
        if let Ok(slot) = self.heartbeat.get_mut() {
            if let Some(task) = slot.take() {
                task.cancel();
            }
        }
    }
}

/// Builder for [`Swetrix`].
///
/// Each `with_*` call swaps the wrapped [`Config`] for a new value.
pub struct Builder {
    config: Config,
    transport: Option<Box<dyn Transport>>,
}

impl Builder {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            config: Config::new(project_id),
            transport: None,
        }
    }

    /// Emit debug-level log lines for every call.
    pub fn with_debug_enabled(mut self, debug_enabled: bool) -> Self {
        self.config = self.config.with_debug_enabled(debug_enabled);
        self
    }

    /// Suppress all outbound requests. Page views still start the session.
    pub fn with_analytics_disabled(mut self, analytics_disabled: bool) -> Self {
        self.config = self.config.with_analytics_disabled(analytics_disabled);
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config = self.config.with_api_url(api_url);
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: std::time::Duration) -> Self {
        self.config = self.config.with_heartbeat_interval(interval);
        self
    }

    /// Replace the default `ureq` transport.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn try_build(self) -> Result<Swetrix, ConfigError> {
        self.config.validate()?;
        let transport = self
            .transport
            .unwrap_or_else(|| Box::new(HttpTransport::new()));
        Ok(Swetrix::from_parts(self.config, transport))
    }

    /// # Panics
    ///
    /// Panics if the project ID or API URL is empty.
    pub fn build(self) -> Swetrix {
        match self.try_build() {
            Ok(client) => client,
            Err(e) => panic!("{e}"),
        }
    }
}
