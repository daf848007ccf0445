use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Substring of the API message sent when a unique event was already
/// recorded for the session. Matching on server wording is fragile; it is
/// the only signal the API gives.
pub(crate) const UNIQUE_COLLISION_MARKER: &str = "unique option provided";

/// Body of `POST <api_url>`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PageView<'a> {
    pub pid: &'a str,
    pub pg: &'a str,
    pub tz: &'a str,
    pub lc: &'a str,
    pub unique: bool,
}

/// Body of `POST <api_url>/custom`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CustomEvent<'a> {
    pub pid: &'a str,
    pub ev: &'a str,
    pub unique: bool,
}

/// Body of `POST <api_url>/hb`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Heartbeat<'a> {
    pub pid: &'a str,
}

/// Error reply of the ingestion API.
///
/// Validation failures carry `message` as an array of strings; the items are
/// joined with `; `.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorEnvelope {
    #[serde(default, deserialize_with = "text")]
    pub error: String,
    #[serde(default, deserialize_with = "text")]
    pub message: String,
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(flatten(Value::deserialize(deserializer)?))
}

fn flatten(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(flatten)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

impl ApiErrorEnvelope {
    /// Whether the API rejected a unique event it has already counted.
    pub fn is_unique_collision(&self) -> bool {
        self.message.contains(UNIQUE_COLLISION_MARKER)
    }
}
