//! Transport layer for the REST backend.
//!
//! `Transport` is the seam the fetchers talk through: `HttpTransport` is the
//! real JSON-over-HTTP client, tests swap in an in-memory backend.

use crate::error::{ApiError, ApiResult};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with '/'
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response: any HTTP status, body parsed as JSON (Null when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for REST transports to allow mocking and abstraction.
/// Only network-level failures are errors here; HTTP error statuses come back
/// as a normal `ApiResponse`.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}

pub struct HttpTransport {
    base_url: String,
    bearer: Option<String>,
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_ms: u64, bearer: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer,
            agent: ureq::Agent::new(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    // Non-JSON bodies (HTML error pages, plain text) are kept as a string
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut req = self
            .agent
            .request(request.method.as_str(), &url)
            .timeout(self.timeout)
            .set("Accept", "application/json");
        if let Some(token) = &self.bearer {
            req = req.set("Authorization", &format!("Bearer {}", token));
        }

        let resp = match &request.body {
            Some(body) => req
                .set("Content-Type", "application/json")
                .send_json(body.clone()),
            None => req.call(),
        };

        match resp {
            Ok(r) => {
                let status = r.status();
                let text = r
                    .into_string()
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok(ApiResponse {
                    status,
                    body: parse_body(&text),
                })
            }
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Ok(ApiResponse {
                    status: code,
                    body: parse_body(&text),
                })
            }
            Err(e) => Err(ApiError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body(r#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(
            parse_body("<html>Bad Gateway</html>"),
            Value::String("<html>Bad Gateway</html>".to_string())
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let t = HttpTransport::new("http://localhost:3000/", 1000, None);
        assert_eq!(t.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening
        let t = HttpTransport::new("http://127.0.0.1:9", 500, None);
        let err = t
            .send(&ApiRequest::new(Method::Get, "/api/users"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn test_response_success_range() {
        let ok = ApiResponse {
            status: 204,
            body: Value::Null,
        };
        assert!(ok.is_success());
        let bad = ApiResponse {
            status: 404,
            body: Value::Null,
        };
        assert!(!bad.is_success());
    }
}
