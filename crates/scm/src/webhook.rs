//! Provider-agnostic webhook types.
//!
//! Every provider's normalizer reduces its own payload shapes to one
//! [`CanonicalWebhookEvent`], or to `None` when the delivery should not trigger
//! a build. The orchestrator only ever sees this canonical form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{BranchName, CommitSha, MergeRequestIid};

/// Whether an event concerns the repository itself or a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Repo,
    Pr,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    Push,
    Opened,
    Reopened,
    Closed,
}

impl WebhookAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookAction::Push => "push",
            WebhookAction::Opened => "opened",
            WebhookAction::Reopened => "reopened",
            WebhookAction::Closed => "closed",
        }
    }
}

/// One actionable webhook delivery in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub action: WebhookAction,
    pub username: String,
    pub checkout_url: String,
    pub branch: BranchName,
    pub sha: CommitSha,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<MergeRequestIid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit_message: Option<String>,
}

/// HTTP headers of a webhook delivery, looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders(BTreeMap<String, String>);

impl WebhookHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Returns the value of `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for WebhookHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
