//! REST client wrapper.
//!
//! `RestClient` joins a transport with the endpoint table, maps non-2xx
//! responses to `ApiError::Server` and decodes collection payloads.

pub mod endpoints;
#[cfg(test)]
pub mod mock;
pub mod transport;

pub use endpoints::Endpoints;
pub use transport::{ApiRequest, HttpTransport, Method, Transport};

use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct RestClient {
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
}

/// Outcome of probing one collection endpoint at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFinding {
    Ok { key: &'static str },
    /// The server doesn't know the path: client and server contracts drifted.
    Missing { key: &'static str, path: String },
    Failed { key: &'static str, reason: String },
}

impl RestClient {
    pub fn new(transport: Box<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request; 2xx yields the body, anything else an `ApiError`.
    pub fn send(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        tracing::debug!(method = %method, path, "api request");

        let response = self.transport.send(&request).map_err(|e| {
            tracing::warn!(method = %method, path, error = %e, "api transport failure");
            e
        })?;

        if response.is_success() {
            tracing::debug!(method = %method, path, status = response.status, "api response");
            Ok(response.body)
        } else {
            let message = error_message(&response.body);
            tracing::warn!(
                method = %method,
                path,
                status = response.status,
                message = %message,
                "api server failure"
            );
            Err(ApiError::Server {
                status: response.status,
                message,
            })
        }
    }

    pub fn get(&self, path: &str) -> ApiResult<Value> {
        self.send(Method::Get, path, None)
    }

    /// GET a collection. Accepts a bare array, an object wrapping the array
    /// under `wrapper` (e.g. `{"users": [...]}`), or an empty body.
    pub fn get_collection<T: DeserializeOwned>(&self, path: &str, wrapper: &str) -> ApiResult<Vec<T>> {
        let body = self.get(path)?;
        decode_collection(body, wrapper)
    }

    /// Hit every collection endpoint once and report what the server knows.
    pub fn probe(&self) -> Vec<ProbeFinding> {
        endpoints::COLLECTION_KEYS
            .iter()
            .map(|key| {
                let path = self.endpoints.get(key).unwrap_or_default().to_string();
                match self.get(&path) {
                    Ok(_) => ProbeFinding::Ok { key },
                    Err(e) if e.status() == Some(404) => ProbeFinding::Missing { key, path },
                    Err(e) => ProbeFinding::Failed {
                        key,
                        reason: e.to_string(),
                    },
                }
            })
            .collect()
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &Value) -> String {
    match body {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => ["message", "error", "msg"]
            .iter()
            .filter_map(|k| map.get(*k))
            .find_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(inner) => inner
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(String::from),
                _ => None,
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Decode a collection body. Rows that don't decode are logged and skipped.
pub fn decode_collection<T: DeserializeOwned>(body: Value, wrapper: &str) -> ApiResult<Vec<T>> {
    let items = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(wrapper) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => {
                return Err(ApiError::Decode(format!(
                    "expected an array or an object with '{}'",
                    wrapper
                )))
            }
            Some(other) => {
                return Err(ApiError::Decode(format!(
                    "'{}' is not an array: {}",
                    wrapper, other
                )))
            }
        },
        other => {
            return Err(ApiError::Decode(format!(
                "expected an array, got {}",
                other
            )))
        }
    };
    let total = items.len();
    let rows: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!(wrapper, index, error = %e, "skipping undecodable row");
                None
            }
        })
        .collect();
    if rows.len() < total {
        tracing::warn!(wrapper, skipped = total - rows.len(), total, "collection partially decoded");
    }
    Ok(rows)
}
