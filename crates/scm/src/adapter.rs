//! The contract every SCM provider implementation satisfies.
//!
//! The orchestrator holds implementations in a [`crate::ScmRegistry`] keyed by
//! [`ScmAdapter::identity_tag`] and never depends on a concrete provider type.
//!
//! ## Error behaviour
//!
//! Every remote operation surfaces [`ScmError`] to the caller with two
//! exceptions:
//!
//! - [`ScmAdapter::report_build_status`] is best-effort and returns `()`.
//! - [`ScmAdapter::can_handle_webhook`] degrades to `false`.

use async_trait::async_trait;

use crate::{
    AccessToken, AuthorDecoration, BreakerStats, BuildStatus, CanonicalWebhookEvent,
    Capabilities, ChangedFiles, CheckoutDescriptor, CommitDecoration, CommitSha, CredentialMode,
    IdentityTag, PullRequestRef, RepositoryAddress, ScmError, WebhookHeaders,
};

/// Inputs for [`ScmAdapter::build_checkout_script`].
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Repository location, usually from [`ScmAdapter::resolve_address`].
    pub location: CheckoutDescriptor,
    pub sha: CommitSha,
    /// Merge request reference from the canonical webhook event
    /// (e.g. `merge_requests/42`).
    pub pr_ref: Option<String>,
    pub credentials: CredentialMode,
}

/// Options for [`ScmAdapter::report_build_status`].
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: BuildStatus,
    /// Link from the commit status back to the build page.
    pub target_url: String,
    /// Name of the status context; the adapter's default when `None`.
    pub job_name: Option<String>,
}

/// Repository, commit and webhook operations consumed by the orchestrator.
#[async_trait]
pub trait ScmAdapter: Send + Sync {
    /// Stable string identifying this provider + host pairing.
    fn identity_tag(&self) -> &IdentityTag;

    /// Recovers owner and repository names for an internal address.
    async fn resolve_address(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<CheckoutDescriptor, ScmError>;

    /// Ensures exactly one hook pointing at `notify_url` exists, updating it in
    /// place when already present.
    async fn register_webhook(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        notify_url: &str,
    ) -> Result<(), ScmError>;

    /// Removes every hook pointing at `notify_url`; returns how many were
    /// removed.
    async fn unregister_webhook(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        notify_url: &str,
    ) -> Result<usize, ScmError>;

    /// Turns an external checkout URL into an internal address.
    async fn translate_checkout_url(
        &self,
        token: &AccessToken,
        checkout_url: &str,
    ) -> Result<RepositoryAddress, ScmError>;

    /// Synthesises the shell commands that check the repository out.
    fn build_checkout_script(&self, request: &CheckoutRequest) -> Result<String, ScmError>;

    /// Head commit of the address's branch.
    async fn latest_commit_sha(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<CommitSha, ScmError>;

    /// Decoded contents of `path` at `git_ref` (the address's branch when
    /// `None`).
    async fn file_contents(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<String, ScmError>;

    async fn open_pull_requests(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<Vec<PullRequestRef>, ScmError>;

    /// Commit metadata together with its decorated author.
    async fn decorate_commit(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        sha: &CommitSha,
    ) -> Result<CommitDecoration, ScmError>;

    /// Matches a commit author against provider accounts.
    async fn decorate_author(
        &self,
        token: &AccessToken,
        name: &str,
        email: &str,
    ) -> Result<AuthorDecoration, ScmError>;

    /// Capabilities the token holder has on the repository.
    async fn permissions_for(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<Capabilities, ScmError>;

    /// Best-effort commit status update. Failures are logged, never returned.
    async fn report_build_status(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        sha: &CommitSha,
        update: &StatusUpdate,
    );

    /// `true` if the delivery carries this provider's signature header and
    /// normalizes to an actionable event. Never fails.
    fn can_handle_webhook(&self, headers: &WebhookHeaders, payload: &serde_json::Value) -> bool;

    /// Reduces a delivery to its canonical event; `Ok(None)` when not
    /// actionable.
    fn normalize_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &serde_json::Value,
    ) -> Result<Option<CanonicalWebhookEvent>, ScmError>;

    /// Files changed between two commits, or [`ChangedFiles::Unknown`].
    async fn changed_files(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        base: &CommitSha,
        head: &CommitSha,
    ) -> Result<ChangedFiles, ScmError>;

    /// Read-only snapshot of this adapter's circuit breaker.
    fn breaker_stats(&self) -> BreakerStats;
}
