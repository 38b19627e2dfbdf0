//! Breaker-guarded request execution and response classification.
//!
//! | Transport result | Caller sees | Breaker records |
//! |------------------|-------------|-----------------|
//! | 2xx | `Ok(ApiResponse)` | healthy |
//! | 4xx other than 429 | `RemoteRejected` | healthy |
//! | 429, 5xx | `RemoteRejected` | unavailable |
//! | timeout | `Timeout` | unavailable |
//! | connection failure | `Transport` | unavailable |
//! | breaker open | `CircuitOpen` | nothing; no request sent |

use std::time::Instant;

use scm::{BreakerStats, ScmError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::breaker::{CircuitBreaker, Outcome};
use crate::config::BreakerConfig;
use crate::transport::{ApiRequest, ResponseBody, Transport};

/// Correlates the log lines of one resilient call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    /// Decodes the body into `T`. An empty body decodes as JSON `null`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ScmError> {
        let result = match self.body {
            ResponseBody::Json(value) => serde_json::from_value(value),
            ResponseBody::Text(text) => serde_json::from_str(&text),
            ResponseBody::Empty => serde_json::from_value(Value::Null),
        };
        result.map_err(|e| ScmError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

/// Owns one [`CircuitBreaker`] and sends every request through it.
pub struct ResilientClient<T> {
    transport: T,
    breaker: CircuitBreaker,
}

impl<T: Transport> ResilientClient<T> {
    pub fn new(transport: T, config: BreakerConfig) -> Self {
        Self {
            transport,
            breaker: CircuitBreaker::new(config),
        }
    }

    /// Sends `request` unless the breaker is open, and classifies the result.
    pub async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ScmError> {
        let call_id = CallId::new();
        let span = tracing::debug_span!(
            "scm.call",
            %call_id,
            method = %request.method,
            path = request.url.path()
        );

        async move {
            let permit = self.breaker.acquire().map_err(|e| {
                debug!(error = %e, "short-circuited");
                e
            })?;

            let start = Instant::now();
            let result = match self.transport.send(&request).await {
                Ok(raw) if (200..300).contains(&raw.status) => Ok(ApiResponse {
                    status: raw.status,
                    body: raw.body,
                }),
                Ok(raw) => Err(ScmError::RemoteRejected {
                    status_code: raw.status,
                    reason: extract_reason(&raw.body),
                }),
                Err(e) => Err(ScmError::from(e)),
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let outcome = match &result {
                Err(e) if e.is_unavailable() => Outcome::Unavailable,
                _ => Outcome::Healthy,
            };
            permit.record(outcome);

            match &result {
                Ok(response) => debug!(status = response.status, elapsed_ms, "call completed"),
                Err(e) => debug!(elapsed_ms, error = %e, "call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// [`ResilientClient::call`] followed by [`ApiResponse::decode`].
    pub async fn call_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ScmError> {
        self.call(request).await?.decode()
    }

    pub fn stats(&self) -> BreakerStats {
        self.breaker.stats()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Pulls a human-readable reason out of an error body.
///
/// GitLab puts it under `message` (a string, or an object of field errors) or,
/// for OAuth failures, under `error` / `error_description`. Anything else is
/// reported verbatim.
pub fn extract_reason(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Json(value) => {
            if let Some(message) = value.get("message") {
                return render(message);
            }
            if let Some(error) = value.get("error") {
                return match value.get("error_description").and_then(Value::as_str) {
                    Some(description) => format!("{}: {description}", render(error)),
                    None => render(error),
                };
            }
            value.to_string()
        }
        ResponseBody::Text(text) => text.clone(),
        ResponseBody::Empty => String::new(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
