use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

/// Response produced by the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    /// Wall-clock time for the whole pipeline
    pub duration_ms: u64,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_service: Option<String>,
}

impl GatewayResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
            duration_ms: 0,
            cached: false,
            from_service: None,
        }
    }

    /// JSON error body `{"error": .., "status_code": ..}`
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();

        Self::new(status, json!({ "error": message, "status_code": status }))
            .with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error message carried in the body, if any
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}
