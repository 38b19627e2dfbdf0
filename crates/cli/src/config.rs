//! Loading `.scm-bridge/config.toml` and applying command-line overrides.
//!
//! ```toml
//! [gitlab]
//! host = "gitlab.example.com"
//! webhook_secret = "..."
//!
//! [gitlab.breaker]
//! failure_threshold = 5
//! cool_down_ms = 30000
//!
//! [checkout]
//! clone_username = "oauth2"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use gitlab::GitLabConfig;
use serde::Deserialize;

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".scm-bridge/config.toml";

const DEFAULT_CLONE_USERNAME: &str = "oauth2";

/// Contents of the config file. Every table is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub gitlab: Option<GitLabConfig>,
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

/// Settings for generated checkout scripts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// User name paired with the token in token-mode clone URLs.
    pub clone_username: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            clone_username: DEFAULT_CLONE_USERNAME.to_string(),
        }
    }
}

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config file")
    }

    /// Reads `explicit` when given (it must exist), otherwise
    /// [`DEFAULT_CONFIG_PATH`] when present, otherwise an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Final GitLab settings after applying `--host`.
    ///
    /// A `--host` naming a different host than the file keeps the file's other
    /// settings except an explicit `api_base_url`, which belongs to the old
    /// host.
    pub fn gitlab(&self, host_override: Option<&str>) -> Result<GitLabConfig> {
        let config = match (self.gitlab.clone(), host_override) {
            (Some(mut config), Some(host)) => {
                if config.host != host {
                    config.api_base_url = None;
                }
                config.host = host.to_string();
                config
            }
            (Some(config), None) => config,
            (None, Some(host)) => GitLabConfig::new(host),
            (None, None) => bail!(
                "no GitLab host configured; pass --host or add a [gitlab] table to {DEFAULT_CONFIG_PATH}"
            ),
        };
        config.validate().context("invalid [gitlab] configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
