//! GitLab webhook deliveries → [`CanonicalWebhookEvent`].
//!
//! Classification is keyed on `object_kind`:
//!
//! | `object_kind` | Accepted when | Canonical event |
//! |---------------|---------------|-----------------|
//! | `push` | `event_name == "push"` and `checkout_sha` present | `repo` / `push` |
//! | `merge_request` | state is `opened`, `reopened`, `closed` or `merged` | `pr` / `opened`, `reopened`, `closed` |
//! | anything else | never | `None` |
//!
//! Tag pushes, branch deletions, comments, pipelines and draft/locked merge
//! requests all yield `None`. A payload of an accepted kind that lacks a
//! required field is an [`ScmError::InvalidWebhook`].
//!
//! Everything here is a pure function of the payload.

use scm::{
    BranchName, CanonicalWebhookEvent, CommitSha, EventType, MergeRequestIid, ScmError,
    WebhookAction, WebhookHeaders,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Present on every GitLab delivery; names the event (e.g. `Push Hook`).
pub const EVENT_HEADER: &str = "X-Gitlab-Event";

/// Carries the secret configured on the hook, when one is set.
pub const TOKEN_HEADER: &str = "X-Gitlab-Token";

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HookProject {
    git_http_url: String,
}

#[derive(Debug, Deserialize)]
struct PushHook {
    #[serde(default)]
    event_name: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    user_username: Option<String>,
    project: HookProject,
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    checkout_sha: Option<String>,
    #[serde(default)]
    commits: Vec<PushCommit>,
}

#[derive(Debug, Deserialize)]
struct PushCommit {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct MergeRequestHook {
    #[serde(default)]
    user: Option<HookUser>,
    #[serde(default)]
    project: Option<HookProject>,
    object_attributes: MergeRequestAttributes,
}

#[derive(Debug, Deserialize)]
struct HookUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MergeRequestAttributes {
    iid: u64,
    state: String,
    target_branch: String,
    last_commit: LastCommit,
    #[serde(default)]
    target: Option<HookProject>,
}

#[derive(Debug, Deserialize)]
struct LastCommit {
    id: String,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Normalizes one delivery. `Ok(None)` means "not actionable".
pub fn normalize(payload: &Value) -> Result<Option<CanonicalWebhookEvent>, ScmError> {
    match payload.get("object_kind").and_then(Value::as_str) {
        Some("push") => normalize_push(parse(payload)?),
        Some("merge_request") => normalize_merge_request(parse(payload)?),
        _ => Ok(None),
    }
}

/// `true` when the delivery looks like it came from GitLab and, if a secret is
/// configured, carries it.
pub fn is_signed(headers: &WebhookHeaders, secret: Option<&str>) -> bool {
    if !headers.contains(EVENT_HEADER) {
        return false;
    }
    match secret {
        Some(secret) => headers.get(TOKEN_HEADER) == Some(secret),
        None => true,
    }
}

/// `merge_requests/42` → `refs/merge-requests/42/head`, the ref GitLab
/// exposes for fetching a merge request's source. Fully qualified refs pass
/// through unchanged.
pub fn merge_request_fetch_ref(pr_ref: &str) -> String {
    match pr_ref.strip_prefix("merge_requests/") {
        Some(iid) => format!("refs/merge-requests/{iid}/head"),
        None => pr_ref.to_string(),
    }
}

/// Last segment of the ref path: `refs/heads/feature/x` → `x`.
fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

fn normalize_push(hook: PushHook) -> Result<Option<CanonicalWebhookEvent>, ScmError> {
    if hook.event_name.as_deref() != Some("push") {
        return Ok(None);
    }
    // Branch deletions carry a null checkout_sha.
    let Some(sha) = hook.checkout_sha.and_then(CommitSha::new) else {
        return Ok(None);
    };
    let branch = BranchName::new(branch_from_ref(&hook.git_ref))
        .ok_or_else(|| invalid(format!("push ref '{}' names no branch", hook.git_ref)))?;
    let last_commit_message = hook
        .commits
        .last()
        .map(|c| c.message.clone())
        .unwrap_or_default();

    Ok(Some(CanonicalWebhookEvent {
        event_type: EventType::Repo,
        action: WebhookAction::Push,
        username: hook.user_name.or(hook.user_username).unwrap_or_default(),
        checkout_url: hook.project.git_http_url,
        branch,
        sha,
        pr_number: None,
        pr_ref: None,
        last_commit_message: Some(last_commit_message),
    }))
}

fn normalize_merge_request(
    hook: MergeRequestHook,
) -> Result<Option<CanonicalWebhookEvent>, ScmError> {
    let attrs = hook.object_attributes;
    let action = match attrs.state.as_str() {
        "opened" => WebhookAction::Opened,
        "reopened" => WebhookAction::Reopened,
        "closed" | "merged" => WebhookAction::Closed,
        _ => return Ok(None),
    };

    let checkout_url = attrs
        .target
        .or(hook.project)
        .map(|p| p.git_http_url)
        .ok_or_else(|| invalid("merge request payload has no target project"))?;
    let branch = BranchName::new(attrs.target_branch)
        .ok_or_else(|| invalid("merge request target_branch is empty"))?;
    let sha = CommitSha::new(attrs.last_commit.id)
        .ok_or_else(|| invalid("merge request last_commit.id is empty"))?;
    let username = hook
        .user
        .and_then(|u| u.name.or(u.username))
        .unwrap_or_default();

    Ok(Some(CanonicalWebhookEvent {
        event_type: EventType::Pr,
        action,
        username,
        checkout_url,
        branch,
        sha,
        pr_number: Some(MergeRequestIid::new(attrs.iid)),
        pr_ref: Some(format!("merge_requests/{}", attrs.iid)),
        last_commit_message: None,
    }))
}

fn parse<T: DeserializeOwned>(payload: &Value) -> Result<T, ScmError> {
    T::deserialize(payload).map_err(|e| invalid(e.to_string()))
}

fn invalid(message: impl Into<String>) -> ScmError {
    ScmError::InvalidWebhook {
        message: message.into(),
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
