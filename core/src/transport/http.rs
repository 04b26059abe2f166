use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use super::{error_message, ApiRequest, Method, Transport, GENERIC_FAILURE};
use crate::config::ClientConfig;
use crate::error::{MonitorError, Result};

/// JSON-over-HTTP transport with a fixed base path and request timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> MonitorError {
        if err.is_timeout() {
            MonitorError::transport(
                None,
                format!("Request timed out after {}s", self.timeout_secs),
            )
        } else {
            MonitorError::transport(
                err.status().map(|s| s.as_u16()),
                format!("{GENERIC_FAILURE}: {err}"),
            )
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = self.url(&request.path);
        debug!("{} {url} {:?}", request.method, request.query);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| error_message(&body));
            let code = status.as_u16();
            return Err(match message {
                Some(msg) if status.is_client_error() => MonitorError::Validation(msg),
                Some(msg) => MonitorError::transport(Some(code), msg),
                None => {
                    MonitorError::transport(Some(code), format!("{GENERIC_FAILURE} (HTTP {code})"))
                }
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            MonitorError::Decode(format!(
                "Invalid JSON from {} {}: {e}",
                request.method, request.path
            ))
        })
    }
}
