//! Swetrix analytics — Rust SDK
//!
//! Reports page views, custom events and heartbeats to the Swetrix
//! ingestion API. Each call is a single blocking JSON POST; results are
//! logged through the [`log`] facade and never returned to the caller.
//!
//! ```no_run
//! env_logger::init();
//!
//! let swetrix = swetrix::Swetrix::builder("abc123")
//!     .with_debug_enabled(true)
//!     .build();
//!
//! swetrix.track_page_view("/home");
//! swetrix.track("signup", true);
//! swetrix.start_heartbeat();
//! ```

mod client;
mod config;
mod environment;
mod heartbeat;
mod transport;
mod types;

pub use client::{Builder, Swetrix};
pub use config::{Config, ConfigError, DEFAULT_API_URL, DEFAULT_HEARTBEAT_INTERVAL};
pub use environment::{locale, time_zone};
pub use transport::{user_agent, HttpTransport, ResponseBody, Transport, TransportError};
pub use types::ApiErrorEnvelope;
