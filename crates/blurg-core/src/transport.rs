//! HTTP transport abstraction for remote diaries.
//!
//! The remote API is plain form-encoded requests answered with JSON, with
//! the diary key sent as the HTTP Basic username and an empty password.
//! [`Transport`] is the seam between the diary client and whatever actually
//! moves bytes: [`HttpTransport`] talks to a real server, while
//! [`crate::server::LoopbackTransport`] answers in-process.

use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;

/// HTTP verbs used by the diary API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A single API call, independent of the base URL it is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub form: Vec<(String, String)>,
    /// Diary key sent as the Basic auth username
    pub key: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            form: Vec::new(),
            key: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Look up a form field by name.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Status code plus decoded JSON body (`null` when the body is empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends API requests to a diary server.
pub trait Transport: Send + Sync {
    /// Send `request` to the server rooted at `base_url`.
    ///
    /// Non-2xx statuses are not errors at this level; only failures to get
    /// any response at all are.
    fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Join a base URL and an API path without doubling the slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("blurg/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Http(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = join_url(base_url, &request.path);
        debug!(method = request.method.as_str(), %url, "sending diary API request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(key) = &request.key {
            builder = builder.basic_auth(key, Some(""));
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let resp = builder.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                TransportError::Unreachable(format!("{url}: {e}"))
            } else {
                TransportError::Http(format!("{url}: {e}"))
            }
        })?;

        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .map_err(|e| TransportError::Http(format!("read body: {e}")))?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| TransportError::Http(format!("HTTP {status} from {url}: {e}")))?
        };

        Ok(ApiResponse { status, body })
    }
}
