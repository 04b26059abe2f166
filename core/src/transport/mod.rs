//! Request/response plumbing between the components and the backend.

mod api;
mod http;

pub use api::MonitorApi;
pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Fallback shown when a failed response carries no usable message.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single JSON request, relative to the transport's base path.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Sends one request and yields the decoded JSON body (`Value::Null` when the
/// response is empty). Every failure, whatever the endpoint, comes back as an
/// already-normalized `MonitorError`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// Pull a human-readable message out of an error body: `message` first, then
/// the backend's `detail` (string, or a list of `{msg}` validation entries).
pub fn error_message(body: &Value) -> Option<String> {
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
        if !msg.trim().is_empty() {
            return Some(msg.to_string());
        }
    }
    match body.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(entries) => {
            let msgs: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_field_wins() {
        let body = json!({"message": "boom", "detail": "other"});
        assert_eq!(error_message(&body).as_deref(), Some("boom"));
    }

    #[test]
    fn detail_string_fallback() {
        let body = json!({"detail": "Address already exists"});
        assert_eq!(
            error_message(&body).as_deref(),
            Some("Address already exists")
        );
    }

    #[test]
    fn detail_validation_list() {
        let body = json!({"detail": [{"loc": ["body", "address"], "msg": "field required"}]});
        assert_eq!(error_message(&body).as_deref(), Some("field required"));
    }

    #[test]
    fn missing_or_blank_message() {
        assert_eq!(error_message(&json!({})), None);
        assert_eq!(error_message(&json!({"message": "  "})), None);
        assert_eq!(error_message(&json!("plain")), None);
    }

    #[test]
    fn request_builder() {
        let req = ApiRequest::get("/transactions/monitoring")
            .with_query("page", 1)
            .with_query("size", 20);
        assert_eq!(req.method, Method::Get);
        assert_eq!(
            req.query,
            vec![("page".into(), "1".into()), ("size".into(), "20".into())]
        );
        assert!(req.body.is_none());
    }
}
