//! Build status → provider commit state.
//!
//! The orchestrator reports build progress with its own status vocabulary;
//! providers accept a narrower set of commit states. The table is fixed and
//! total: statuses the orchestrator sends that this crate does not know map to
//! [`CommitState::Failed`], never to success.

use serde::{Deserialize, Serialize};

/// Build status as the orchestrator reports it.
///
/// Parsing is lenient: any unrecognised value becomes [`BuildStatus::Other`]
/// rather than an error, so a newer orchestrator never breaks status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Success,
    Failure,
    Aborted,
    Running,
    Queued,
    /// A status value outside the known set, kept verbatim for logging.
    Other(String),
}

impl BuildStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::Aborted => "ABORTED",
            BuildStatus::Running => "RUNNING",
            BuildStatus::Queued => "QUEUED",
            BuildStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "SUCCESS" => BuildStatus::Success,
            "FAILURE" => BuildStatus::Failure,
            "ABORTED" => BuildStatus::Aborted,
            "RUNNING" => BuildStatus::Running,
            "QUEUED" => BuildStatus::Queued,
            _ => BuildStatus::Other(value.to_string()),
        }
    }
}

impl From<String> for BuildStatus {
    fn from(value: String) -> Self {
        BuildStatus::from(value.as_str())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commit state accepted by the provider's commit-status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Pending,
    Success,
    Failed,
}

impl CommitState {
    /// Wire value sent to the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider state plus the human description shown next to the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub state: CommitState,
    pub description: &'static str,
}

/// Maps an orchestrator build status onto the provider's commit state.
pub fn map_build_status(status: &BuildStatus) -> StatusReport {
    let (state, description) = match status {
        BuildStatus::Success => (CommitState::Success, "Everything looks good!"),
        BuildStatus::Failure => (CommitState::Failed, "Did not work as expected."),
        BuildStatus::Aborted => (CommitState::Failed, "Aborted mid-flight"),
        BuildStatus::Running => (CommitState::Pending, "Testing your code..."),
        BuildStatus::Queued => (CommitState::Pending, "Looking for a place to park..."),
        BuildStatus::Other(_) => (CommitState::Failed, "Unknown build status"),
    };
    StatusReport { state, description }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
