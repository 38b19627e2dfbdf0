//! Error and retry-policy types shared by every adapter.
//!
//! [`ScmError`] is the single error type crossing the [`crate::ScmAdapter`]
//! boundary. Provider crates map their transport and decoding failures into it
//! so the orchestrator never sees provider-specific error types.
//!
//! [`RetryPolicy`] lets the orchestrator decide whether to re-invoke an
//! operation; every [`ScmError`] can produce one.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// ## Rules
///
/// - `Retryable` errors: open circuit, timeouts, connection failures, HTTP 429
///   and 5xx rejections.
/// - `NonRetryable` errors: malformed input, host mismatch, other 4xx
///   rejections, undecodable responses, invalid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried without a change in input or
    /// configuration.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Adapter errors
// ---------------------------------------------------------------------------

/// Errors surfaced by adapter operations.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ScmError {
    /// An internal address string does not have the `host:repositoryId:branch`
    /// shape, or a field to be encoded contains the `:` separator.
    #[error("Malformed repository address '{address}': {reason}")]
    MalformedAddress {
        /// The offending address (or field value, when encoding).
        address: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A checkout URL does not match `protocol://host/owner/repo(.git)?(#branch)?`.
    #[error("Unsupported checkout URL: {url}")]
    UnsupportedUrl {
        /// The rejected URL.
        url: String,
    },

    /// A checkout URL names a host other than the one this adapter serves.
    ///
    /// Never auto-corrected.
    #[error("Checkout URL host '{actual}' does not match configured host '{expected}'")]
    HostMismatch {
        /// Host this adapter is configured for.
        expected: String,
        /// Host found in the checkout URL.
        actual: String,
    },

    /// The provider answered with a non-2xx status.
    #[error("Remote rejected request with HTTP {status_code}: {reason}")]
    RemoteRejected {
        /// HTTP status returned by the provider.
        status_code: u16,
        /// Structured error message from the body, or the raw body.
        reason: String,
    },

    /// The circuit breaker short-circuited the call; no request was sent.
    #[error("Circuit open: provider calls suspended for {retry_after:?}")]
    CircuitOpen {
        /// Time remaining until the breaker admits a probe call.
        retry_after: Duration,
    },

    /// The transport gave up waiting for the provider.
    #[error("Request timed out")]
    Timeout,

    /// The transport failed before a response arrived (DNS, TLS, refused
    /// connection).
    #[error("Transport failure: {message}")]
    Transport {
        /// Description from the transport.
        message: String,
    },

    /// A 2xx response body did not have the expected shape.
    #[error("Invalid provider response: {message}")]
    InvalidResponse {
        /// Decoding failure description.
        message: String,
    },

    /// A webhook payload of a recognised kind is missing required fields.
    #[error("Invalid webhook payload: {message}")]
    InvalidWebhook {
        /// Decoding failure description.
        message: String,
    },

    /// Adapter configuration is invalid. Produced at construction time.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl ScmError {
    /// Classifies this error for the orchestrator's retry decision.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            ScmError::CircuitOpen { retry_after } => RetryPolicy::Retryable {
                after: Some(*retry_after),
            },
            ScmError::Timeout | ScmError::Transport { .. } => {
                RetryPolicy::Retryable { after: None }
            }
            ScmError::RemoteRejected { status_code, .. }
                if *status_code == 429 || *status_code >= 500 =>
            {
                RetryPolicy::Retryable { after: None }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Returns `true` if this failure indicates the provider itself is
    /// unavailable (as opposed to rejecting this particular request).
    ///
    /// The circuit breaker counts only these outcomes as failures.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ScmError::Timeout | ScmError::Transport { .. } => true,
            ScmError::RemoteRejected { status_code, .. } => {
                *status_code == 429 || *status_code >= 500
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
