//! Adapter configuration.
//!
//! [`GitLabConfig`] deserializes from the `[gitlab]` table of the CLI config
//! file; every field except `host` has a default. Call
//! [`GitLabConfig::validate`] before constructing an adapter.

use std::time::Duration;

use scm::{Hostname, ScmError, DEFAULT_BRANCH};
use serde::Deserialize;
use url::Url;

const DEFAULT_STATUS_CONTEXT: &str = "scm-bridge";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_COOL_DOWN_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// Breaker
// ---------------------------------------------------------------------------

/// Circuit breaker tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive unavailable outcomes that open the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before admitting a probe call.
    pub cool_down_ms: u64,
}

impl BreakerConfig {
    pub fn cool_down(&self) -> Duration {
        Duration::from_millis(self.cool_down_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cool_down_ms: DEFAULT_COOL_DOWN_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Settings for one GitLab host.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabConfig {
    /// Host (optionally `host:port`) this adapter serves. Checkout URLs for any
    /// other host are rejected.
    pub host: String,
    /// REST API root. Defaults to `https://{host}/api/v4`.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Branch assumed when a checkout URL has no `#branch` suffix.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Secret GitLab sends back in `X-Gitlab-Token` on every delivery.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Commit status name used when a status update names no job.
    #[serde(default = "default_status_context")]
    pub status_context: String,
    /// Per-request transport timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub breaker: BreakerConfig,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_status_context() -> String {
    DEFAULT_STATUS_CONTEXT.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl GitLabConfig {
    /// Configuration for `host` with every other field at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_base_url: None,
            default_branch: default_branch(),
            webhook_secret: None,
            status_context: default_status_context(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            breaker: BreakerConfig::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured host as a [`Hostname`].
    pub fn hostname(&self) -> Result<Hostname, ScmError> {
        Hostname::new(self.host.trim()).ok_or_else(|| invalid("host must not be empty"))
    }

    /// The REST API root, derived from `host` when not set explicitly.
    pub fn api_base(&self) -> Result<Url, ScmError> {
        let raw = match &self.api_base_url {
            Some(url) => url.clone(),
            None => format!("https://{}/api/v4", self.host.trim()),
        };
        let url =
            Url::parse(&raw).map_err(|e| invalid(format!("api_base_url '{raw}' is invalid: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(invalid(format!("api_base_url '{raw}' cannot be a base URL")));
        }
        Ok(url)
    }

    /// Checks every field that could only fail later at call time.
    pub fn validate(&self) -> Result<(), ScmError> {
        self.hostname()?;
        self.api_base()?;
        if self.default_branch.is_empty() || self.default_branch.contains(':') {
            return Err(invalid(format!(
                "default_branch '{}' must be non-empty and free of ':'",
                self.default_branch
            )));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(invalid("breaker.failure_threshold must be at least 1"));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("host", &self.host)
            .field("api_base_url", &self.api_base_url)
            .field("default_branch", &self.default_branch)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "***"),
            )
            .field("status_context", &self.status_context)
            .field("timeout_ms", &self.timeout_ms)
            .field("breaker", &self.breaker)
            .finish()
    }
}

fn invalid(message: impl Into<String>) -> ScmError {
    ScmError::Configuration {
        message: message.into(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
