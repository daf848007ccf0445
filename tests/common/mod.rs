#![allow(dead_code)]

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::Value;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};
use swetrix::{ResponseBody, Transport, TransportError};

// ------------------------------------------------------------------
// Transport
// ------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Empty,
    Json(Value),
    Fail,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub body: Value,
}

struct MockState {
    requests: Vec<Request>,
    reply: Reply,
}

/// Records every request and answers with a canned reply.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(reply: Reply) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                requests: Vec::new(),
                reply,
            })),
        }
    }

    pub fn empty() -> Self {
        Self::new(Reply::Empty)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn count_to(&self, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }
}

impl Transport for MockTransport {
    fn post(&self, url: &str, body: &Value) -> Result<Option<ResponseBody>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request {
            url: url.to_string(),
            body: body.clone(),
        });
        match &state.reply {
            Reply::Empty => Ok(None),
            Reply::Json(Value::Object(map)) => Ok(Some(map.clone())),
            Reply::Json(_) => Err(TransportError::NotAnObject),
            Reply::Fail => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

// ------------------------------------------------------------------
// Logging
// ------------------------------------------------------------------

struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

pub fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Log lines emitted by the client for `project_id`.
pub fn logs_for(project_id: &str) -> Vec<(Level, String)> {
    let tag = format!("[swetrix:{project_id}]");
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, msg)| msg.starts_with(&tag))
        .cloned()
        .collect()
}

pub fn logs_at(project_id: &str, level: Level) -> Vec<String> {
    logs_for(project_id)
        .into_iter()
        .filter(|(l, _)| *l == level)
        .map(|(_, msg)| msg)
        .collect()
}

// ------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------

pub fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}
