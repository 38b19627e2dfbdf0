//! [`ScmAdapter`] over the GitLab v4 REST API.
//!
//! The orchestrator hands over a parsed [`RepositoryAddress`]; each operation
//! turns it into one or more [`ResilientClient`] calls against the project
//! named by the address's repository id and maps the response into the shared
//! domain types. Every call goes through the adapter's single breaker.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use scm::{
    build_checkout_script, map_access_level, map_build_status, AccessToken, AuthorDecoration,
    BreakerStats, CanonicalWebhookEvent, Capabilities, ChangedFiles, CheckoutDescriptor,
    CheckoutParams, CheckoutRequest, CommitDecoration, CommitSha, Hostname, IdentityTag,
    MergeRequestIid, PullRequestRef, RepositoryAddress, ScmAdapter, ScmError, StatusUpdate,
    WebhookHeaders,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::api::{Branch, Commit, Endpoints, FileContent, Hook, MergeRequest, Project, User};
use crate::client::ResilientClient;
use crate::config::GitLabConfig;
use crate::hooks;
use crate::transport::{ApiRequest, ReqwestTransport, Transport};

/// Largest page GitLab serves. A shorter page is the last one.
const PAGE_SIZE: usize = 100;

/// GitLab implementation of [`ScmAdapter`] for one host.
pub struct GitLabScm<T = ReqwestTransport> {
    config: GitLabConfig,
    host: Hostname,
    tag: IdentityTag,
    endpoints: Endpoints,
    client: ResilientClient<T>,
}

impl GitLabScm<ReqwestTransport> {
    /// Validates `config` and builds an adapter with a real HTTP transport.
    pub fn from_config(config: GitLabConfig) -> Result<Self, ScmError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> GitLabScm<T> {
    pub fn with_transport(config: GitLabConfig, transport: T) -> Result<Self, ScmError> {
        config.validate()?;
        let host = config.hostname()?;
        let tag = IdentityTag::new(format!("gitlab:{host}")).ok_or_else(|| {
            ScmError::Configuration {
                message: "identity tag must not be empty".into(),
            }
        })?;
        let api_base = config.api_base()?;
        info!(tag = %tag, api = %api_base, "gitlab adapter ready");
        let endpoints = Endpoints::new(api_base);
        let client = ResilientClient::new(transport, config.breaker.clone());
        Ok(Self {
            config,
            host,
            tag,
            endpoints,
            client,
        })
    }

    /// Wraps the adapter for registration in an [`scm::ScmRegistry`].
    pub fn into_shared(self) -> Arc<dyn ScmAdapter>
    where
        T: 'static,
    {
        Arc::new(self)
    }

    pub fn config(&self) -> &GitLabConfig {
        &self.config
    }

    pub fn client(&self) -> &ResilientClient<T> {
        &self.client
    }

    async fn project(&self, token: &AccessToken, project: &str) -> Result<Project, ScmError> {
        let url = self.endpoints.project(project)?;
        self.client
            .call_json(ApiRequest::get(url).with_token(token))
            .await
    }

    /// Reads every page of a list endpoint.
    async fn paginated<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<R>, ScmError> {
        let mut items = Vec::new();
        for page in 1.. {
            let batch: Vec<R> = self
                .client
                .call_json(
                    request
                        .clone()
                        .with_query("per_page", PAGE_SIZE.to_string())
                        .with_query("page", page.to_string()),
                )
                .await?;
            let last = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if last {
                break;
            }
        }
        Ok(items)
    }

    async fn hooks(&self, token: &AccessToken, project: &str) -> Result<Vec<Hook>, ScmError> {
        let url = self.endpoints.hooks(project)?;
        self.paginated(ApiRequest::get(url).with_token(token)).await
    }

    async fn commit(
        &self,
        token: &AccessToken,
        project: &str,
        sha: &CommitSha,
    ) -> Result<Commit, ScmError> {
        let url = self.endpoints.commit(project, sha.as_str())?;
        self.client
            .call_json(ApiRequest::get(url).with_token(token))
            .await
    }

    fn hook_body(&self, notify_url: &str) -> Value {
        let mut body = json!({
            "url": notify_url,
            "push_events": true,
            "merge_requests_events": true,
            "tag_push_events": false,
            "enable_ssl_verification": true,
        });
        if let Some(secret) = &self.config.webhook_secret {
            body["token"] = Value::String(secret.clone());
        }
        body
    }
}

#[async_trait]
impl<T: Transport> ScmAdapter for GitLabScm<T> {
    fn identity_tag(&self) -> &IdentityTag {
        &self.tag
    }

    #[instrument(name = "scm.resolve_address", skip_all, fields(address = %address))]
    async fn resolve_address(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<CheckoutDescriptor, ScmError> {
        let project = self
            .project(token, address.repository_id().as_str())
            .await?;
        Ok(CheckoutDescriptor {
            hostname: address.hostname().clone(),
            owner: project.namespace.full_path,
            reponame: project.path,
            branch: address.branch().clone(),
        })
    }

    #[instrument(name = "scm.register_webhook", skip_all, fields(address = %address))]
    async fn register_webhook(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        notify_url: &str,
    ) -> Result<(), ScmError> {
        let project = address.repository_id().as_str();
        let existing = self
            .hooks(token, project)
            .await?
            .into_iter()
            .find(|hook| hook.url == notify_url);

        let body = self.hook_body(notify_url);
        match existing {
            Some(hook) => {
                let url = self.endpoints.hook(project, hook.id)?;
                self.client
                    .call(ApiRequest::put(url, body).with_token(token))
                    .await?;
                info!(hook_id = hook.id, "webhook updated");
            }
            None => {
                let url = self.endpoints.hooks(project)?;
                self.client
                    .call(ApiRequest::post(url, body).with_token(token))
                    .await?;
                info!("webhook created");
            }
        }
        Ok(())
    }

    #[instrument(name = "scm.unregister_webhook", skip_all, fields(address = %address))]
    async fn unregister_webhook(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        notify_url: &str,
    ) -> Result<usize, ScmError> {
        let project = address.repository_id().as_str();
        let mut removed = 0;
        for hook in self.hooks(token, project).await? {
            if hook.url != notify_url {
                continue;
            }
            let url = self.endpoints.hook(project, hook.id)?;
            self.client
                .call(ApiRequest::delete(url).with_token(token))
                .await?;
            removed += 1;
        }
        info!(removed, "webhooks removed");
        Ok(removed)
    }

    #[instrument(name = "scm.translate_checkout_url", skip_all)]
    async fn translate_checkout_url(
        &self,
        token: &AccessToken,
        checkout_url: &str,
    ) -> Result<RepositoryAddress, ScmError> {
        let descriptor = CheckoutDescriptor::parse_for_host(
            checkout_url,
            &self.host,
            &self.config.default_branch,
        )?;
        let project = self.project(token, &descriptor.full_path()).await?;
        RepositoryAddress::new(
            self.host.as_str(),
            &project.id.to_string(),
            descriptor.branch.as_str(),
        )
    }

    fn build_checkout_script(&self, request: &CheckoutRequest) -> Result<String, ScmError> {
        let params = CheckoutParams {
            hostname: request.location.hostname.clone(),
            owner: request.location.owner.clone(),
            reponame: request.location.reponame.clone(),
            branch: request.location.branch.clone(),
            sha: request.sha.clone(),
            pr_fetch_ref: request
                .pr_ref
                .as_deref()
                .map(hooks::merge_request_fetch_ref),
            credentials: request.credentials.clone(),
        };
        build_checkout_script(&params)
    }

    #[instrument(name = "scm.latest_commit_sha", skip_all, fields(address = %address))]
    async fn latest_commit_sha(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<CommitSha, ScmError> {
        let url = self.endpoints.branch(
            address.repository_id().as_str(),
            address.branch().as_str(),
        )?;
        let branch: Branch = self
            .client
            .call_json(ApiRequest::get(url).with_token(token))
            .await?;
        CommitSha::new(branch.commit.id).ok_or_else(|| ScmError::InvalidResponse {
            message: "branch head commit id is empty".into(),
        })
    }

    #[instrument(name = "scm.file_contents", skip_all, fields(address = %address, path = path))]
    async fn file_contents(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<String, ScmError> {
        let url = self
            .endpoints
            .file(address.repository_id().as_str(), path)?;
        let git_ref = git_ref.unwrap_or(address.branch().as_str());
        let file: FileContent = self
            .client
            .call_json(
                ApiRequest::get(url)
                    .with_token(token)
                    .with_query("ref", git_ref),
            )
            .await?;
        decode_file(file)
    }

    #[instrument(name = "scm.open_pull_requests", skip_all, fields(address = %address))]
    async fn open_pull_requests(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<Vec<PullRequestRef>, ScmError> {
        let url = self
            .endpoints
            .merge_requests(address.repository_id().as_str())?;
        let merge_requests: Vec<MergeRequest> = self
            .paginated(
                ApiRequest::get(url)
                    .with_token(token)
                    .with_query("state", "opened"),
            )
            .await?;
        Ok(merge_requests
            .into_iter()
            .map(|mr| PullRequestRef {
                name: mr.title,
                git_ref: format!("merge_requests/{}", mr.iid),
                number: MergeRequestIid::new(mr.iid),
            })
            .collect())
    }

    #[instrument(name = "scm.decorate_commit", skip_all, fields(address = %address, sha = %sha))]
    async fn decorate_commit(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        sha: &CommitSha,
    ) -> Result<CommitDecoration, ScmError> {
        let project_id = address.repository_id().as_str();
        let commit = self.commit(token, project_id, sha).await?;

        let author = match commit.author_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                let email = commit.author_email.as_deref().unwrap_or_default();
                self.decorate_author(token, name, email).await?
            }
            None => AuthorDecoration::placeholder(),
        };
        let url = match commit.web_url {
            Some(url) => url,
            // Older GitLab releases omit web_url on commits.
            None => {
                let project = self.project(token, project_id).await?;
                format!("{}/-/commit/{}", project.web_url, commit.id)
            }
        };

        Ok(CommitDecoration {
            sha: sha.clone(),
            author,
            message: commit.message,
            url,
        })
    }

    #[instrument(name = "scm.decorate_author", skip_all)]
    async fn decorate_author(
        &self,
        token: &AccessToken,
        name: &str,
        email: &str,
    ) -> Result<AuthorDecoration, ScmError> {
        if name.trim().is_empty() {
            return Ok(AuthorDecoration::placeholder());
        }
        let mut author = AuthorDecoration {
            name: name.to_string(),
            email: email.to_string(),
            username: None,
            avatar_url: None,
        };
        if email.is_empty() {
            return Ok(author);
        }

        let url = self.endpoints.users()?;
        let users: Vec<User> = self
            .client
            .call_json(
                ApiRequest::get(url)
                    .with_token(token)
                    .with_query("search", email),
            )
            .await?;
        match users.into_iter().next() {
            Some(user) => {
                author.username = Some(user.username);
                author.avatar_url = user.avatar_url;
            }
            None => debug!("no account matches commit author"),
        }
        Ok(author)
    }

    #[instrument(name = "scm.permissions_for", skip_all, fields(address = %address))]
    async fn permissions_for(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
    ) -> Result<Capabilities, ScmError> {
        let project = self
            .project(token, address.repository_id().as_str())
            .await?;
        let level = project.permissions.unwrap_or_default().effective_level();
        debug!(access_level = level.as_u32(), "effective access level");
        Ok(map_access_level(level))
    }

    #[instrument(
        name = "scm.report_build_status",
        skip_all,
        fields(address = %address, sha = %sha, status = %update.status)
    )]
    async fn report_build_status(
        &self,
        token: &AccessToken,
        address: &RepositoryAddress,
        sha: &CommitSha,
        update: &StatusUpdate,
    ) {
        let report = map_build_status(&update.status);
        let name = update
            .job_name
            .as_deref()
            .unwrap_or(self.config.status_context.as_str());
        let body = json!({
            "state": report.state.as_str(),
            "target_url": update.target_url,
            "description": report.description,
            "name": name,
        });

        let result = match self
            .endpoints
            .statuses(address.repository_id().as_str(), sha.as_str())
        {
            Ok(url) => {
                self.client
                    .call(ApiRequest::post(url, body).with_token(token))
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => debug!(state = %report.state, "commit status reported"),
            Err(e) => warn!(error = %e, "commit status update failed"),
        }
    }

    fn can_handle_webhook(&self, headers: &WebhookHeaders, payload: &Value) -> bool {
        if !hooks::is_signed(headers, self.config.webhook_secret.as_deref()) {
            return false;
        }
        match hooks::normalize(payload) {
            Ok(event) => event.is_some(),
            Err(e) => {
                debug!(error = %e, "webhook rejected");
                false
            }
        }
    }

    fn normalize_webhook(
        &self,
        _headers: &WebhookHeaders,
        payload: &Value,
    ) -> Result<Option<CanonicalWebhookEvent>, ScmError> {
        hooks::normalize(payload)
    }

    async fn changed_files(
        &self,
        _token: &AccessToken,
        _address: &RepositoryAddress,
        _base: &CommitSha,
        _head: &CommitSha,
    ) -> Result<ChangedFiles, ScmError> {
        Ok(ChangedFiles::Unknown)
    }

    fn breaker_stats(&self) -> BreakerStats {
        self.client.stats()
    }
}

/// Decodes the `content` of a repository file response.
fn decode_file(file: FileContent) -> Result<String, ScmError> {
    let invalid = |message: String| ScmError::InvalidResponse { message };
    match file.encoding.as_str() {
        "base64" => {
            let compact: String = file
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| invalid(format!("file content is not valid base64: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| invalid(format!("file content is not UTF-8: {e}")))
        }
        "text" | "" => Ok(file.content),
        other => Err(invalid(format!("unsupported file encoding '{other}'"))),
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
