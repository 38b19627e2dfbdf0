//! Value types returned across the adapter boundary.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry the
//! results of provider lookups (commit metadata, open merge requests) and
//! observability snapshots (breaker statistics).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CommitSha, MergeRequestIid};

// ---------------------------------------------------------------------------
// Commit decoration
// ---------------------------------------------------------------------------

/// Author of a commit, enriched with the provider account when one matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDecoration {
    /// Display name.
    pub name: String,
    /// E-mail recorded on the commit. Empty for the placeholder author.
    pub email: String,
    /// Provider account name, when the e-mail matches an account.
    pub username: Option<String>,
    /// Avatar image URL of the matching account.
    pub avatar_url: Option<String>,
}

impl AuthorDecoration {
    /// Name used when a commit carries no attributable author.
    pub const PLACEHOLDER_NAME: &'static str = "Unknown author";

    /// Fixed author returned for commits without an author name.
    pub fn placeholder() -> Self {
        Self {
            name: Self::PLACEHOLDER_NAME.to_string(),
            email: String::new(),
            username: None,
            avatar_url: None,
        }
    }
}

/// Commit metadata the orchestrator shows next to a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDecoration {
    pub sha: CommitSha,
    pub author: AuthorDecoration,
    pub message: String,
    /// Web URL of the commit on the provider.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Merge requests
// ---------------------------------------------------------------------------

/// One open merge request, as offered for manual builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Title of the merge request.
    pub name: String,
    /// Reference the checkout script fetches (e.g. `merge_requests/42`).
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub number: MergeRequestIid,
}

// ---------------------------------------------------------------------------
// Changed files
// ---------------------------------------------------------------------------

/// Result of asking which files changed between two commits.
///
/// `Unknown` is distinct from `Known(vec![])`: the first means the provider
/// cannot answer, the second that nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedFiles {
    Unknown,
    Known(Vec<String>),
}

// ---------------------------------------------------------------------------
// Breaker statistics
// ---------------------------------------------------------------------------

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakerState {
    /// Calls pass through.
    Closed,
    /// Calls fail immediately until the cool-down elapses.
    Open,
    /// A single probe call decides whether to close again.
    HalfOpen,
}

/// Read-only snapshot of an adapter's circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStats {
    pub state: BreakerState,
    /// Healthy outcomes since the breaker last closed.
    pub success_count: u64,
    /// Consecutive unavailable outcomes.
    pub failure_count: u64,
    /// When the breaker last opened, if it has ever opened.
    pub opened_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
