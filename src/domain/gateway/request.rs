//! Inbound request as seen by the gateway pipeline

use std::collections::HashMap;

use bytes::Bytes;
use serde_json::Value;

use crate::domain::route::HttpMethod;

/// A request entering the pipeline
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub request_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub query: HashMap<String, String>,
    headers: HashMap<String, String>,
    /// Parsed body, present only when the payload is JSON
    pub body: Option<Value>,
    /// Bytes as received, forwarded upstream untouched
    pub raw_body: Option<Bytes>,
    pub client_ip: String,
    /// Authenticated user, filled in by the auth stage
    pub user_id: Option<String>,
}

impl GatewayRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            raw_body: None,
            client_ip: "unknown".to_string(),
            user_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Keep the received bytes and parse them when they hold JSON
    pub fn with_raw_body(mut self, raw: impl Into<Bytes>) -> Self {
        let raw = raw.into();
        self.body = serde_json::from_slice(&raw).ok();
        self.raw_body = Some(raw);
        self
    }

    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = ip.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_lowercase())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    pub fn referer(&self) -> Option<&str> {
        self.header("referer")
    }

    /// Received length of the body, or the serialized JSON length when only
    /// a parsed body is present; zero when absent
    pub fn body_size(&self) -> usize {
        match (&self.raw_body, &self.body) {
            (Some(raw), _) => raw.len(),
            (None, Some(body)) => body.to_string().len(),
            (None, None) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = GatewayRequest::new(HttpMethod::Get, "/a").with_header("X-API-Key", "secret");

        assert_eq!(request.header("x-api-key"), Some("secret"));
        assert_eq!(request.header("X-Api-Key"), Some("secret"));
    }

    #[test]
    fn test_remove_header() {
        let mut request = GatewayRequest::new(HttpMethod::Get, "/a").with_header("Cookie", "a=b");
        assert_eq!(request.remove_header("COOKIE"), Some("a=b".to_string()));
        assert!(request.header("cookie").is_none());
    }

    #[test]
    fn test_body_size() {
        let empty = GatewayRequest::new(HttpMethod::Post, "/a");
        assert_eq!(empty.body_size(), 0);

        let request = GatewayRequest::new(HttpMethod::Post, "/a").with_body(json!({"a": 1}));
        assert_eq!(request.body_size(), r#"{"a":1}"#.len());
    }

    #[test]
    fn test_raw_body_keeps_form_payload() {
        let request = GatewayRequest::new(HttpMethod::Post, "/a").with_raw_body("a=1&b=2");

        assert!(request.body.is_none());
        assert_eq!(request.raw_body.as_deref(), Some(&b"a=1&b=2"[..]));
        assert_eq!(request.body_size(), 7);
    }

    #[test]
    fn test_raw_body_parses_json() {
        let request = GatewayRequest::new(HttpMethod::Post, "/a").with_raw_body(r#"{ "a": 1 }"#);

        assert_eq!(request.body, Some(json!({"a": 1})));
        assert_eq!(request.body_size(), r#"{ "a": 1 }"#.len());
    }
}
