use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

const PRODUCT: &str = concat!("swetrix-rs/", env!("CARGO_PKG_VERSION"));

static USER_AGENT: OnceLock<String> = OnceLock::new();

/// Decoded JSON object returned by the API, if any.
pub type ResponseBody = Map<String, Value>;

/// Failure to deliver a request or to make sense of the reply.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport error: {0}")]
    Transport(Box<ureq::Transport>),
    #[error("Failed to read response body: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response body is not a JSON object")]
    NotAnObject,
}

/// Performs a single JSON POST.
///
/// Returns `Ok(None)` when the server answered with an empty body and the
/// decoded object otherwise. Implementations must not log; classification
/// of the reply is up to the caller.
pub trait Transport: Send + Sync {
    fn post(&self, url: &str, body: &Value) -> Result<Option<ResponseBody>, TransportError>;
}

/// Blocking transport backed by one reusable `ureq` agent.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, body: &Value) -> Result<Option<ResponseBody>, TransportError> {
        let payload = serde_json::to_vec(body)?;

        let result = self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .set("User-Agent", user_agent())
            .send_bytes(&payload);

        // Error envelopes arrive with 4xx statuses, their body still counts.
        let response = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_status, resp)) => resp,
            Err(ureq::Error::Transport(e)) => return Err(TransportError::Transport(Box::new(e))),
        };

        let text = response.into_string()?;
        decode_body(&text)
    }
}

/// Decode a response body: empty means success, anything else must be a
/// JSON object.
pub(crate) fn decode_body(text: &str) -> Result<Option<ResponseBody>, TransportError> {
    if text.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(TransportError::NotAnObject),
    }
}

/// The `User-Agent` sent with every request, built once per process.
///
/// The device descriptor only feeds the API's device classification.
pub fn user_agent() -> &'static str {
    USER_AGENT.get_or_init(|| format!("{}{PRODUCT}", device_descriptor(std::env::consts::OS)))
}

fn device_descriptor(os: &str) -> &'static str {
    match os {
        "android" => "(Linux; U; Android 10) Mobile ",
        "macos" => "(Macintosh; Intel Mac OS X 10_15_7) ",
        "linux" => "(X11; Linux x86_64) ",
        "windows" => "(Windows NT 10.0; Win64; x64) ",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_success() {
        assert!(decode_body("").unwrap().is_none());
    }

    #[test]
    fn object_body_is_returned_as_is() {
        let body = decode_body(r#"{"error":"X","message":"Y","extra":1}"#)
            .unwrap()
            .unwrap();
        assert_eq!(body["error"], "X");
        assert_eq!(body["message"], "Y");
        assert_eq!(body["extra"], 1);
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(
            decode_body("[1,2,3]"),
            Err(TransportError::NotAnObject)
        ));
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(matches!(decode_body("<html>"), Err(TransportError::Json(_))));
    }

    #[test]
    fn device_descriptors() {
        assert_eq!(device_descriptor("android"), "(Linux; U; Android 10) Mobile ");
        assert!(device_descriptor("macos").starts_with("(Macintosh;"));
        assert!(device_descriptor("linux").starts_with("(X11; Linux"));
        assert!(device_descriptor("windows").starts_with("(Windows NT"));
        assert_eq!(device_descriptor("haiku"), "");
    }

    #[test]
    fn user_agent_ends_with_product() {
        assert!(user_agent().ends_with(PRODUCT));
        assert!(std::ptr::eq(user_agent(), user_agent()));
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let transport = HttpTransport::new();
        let result = transport.post("http://127.0.0.1:1/log", &serde_json::json!({"pid": "x"}));
        assert!(matches!(result, Err(TransportError::Transport(_))));
    }
}
