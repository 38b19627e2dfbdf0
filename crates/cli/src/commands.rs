//! One handler per subcommand.
//!
//! Handlers take the adapter as `&dyn ScmAdapter` so they exercise exactly the
//! surface the orchestrator consumes. Results are written to stdout as JSON;
//! checkout scripts are written raw.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use scm::{
    AccessToken, BuildStatus, CheckoutRequest, CommitSha, CredentialMode, RepositoryAddress,
    ScmAdapter, ScmRegistry, StatusUpdate, WebhookHeaders,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Credential strategy for generated checkout scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CredentialModeArg {
    Ssh,
    Token,
    Anonymous,
}

impl CredentialModeArg {
    /// Resolves the strategy; token mode requires a token.
    pub fn resolve(self, username: &str, token: Option<&AccessToken>) -> Result<CredentialMode> {
        Ok(match self {
            CredentialModeArg::Ssh => CredentialMode::Ssh,
            CredentialModeArg::Anonymous => CredentialMode::Anonymous,
            CredentialModeArg::Token => CredentialMode::Token {
                username: username.to_string(),
                token: token
                    .cloned()
                    .context("--credential-mode token requires --token or GITLAB_TOKEN")?,
            },
        })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    println!("{text}");
    Ok(())
}

pub fn parse_address(raw: &str) -> Result<RepositoryAddress> {
    RepositoryAddress::decode(raw).with_context(|| format!("bad repository address '{raw}'"))
}

pub fn parse_sha(raw: &str) -> Result<CommitSha> {
    CommitSha::new(raw).context("commit SHA must not be empty")
}

pub fn parse_status(raw: &str) -> BuildStatus {
    BuildStatus::from(raw)
}

/// Parses `Name: value` header arguments.
pub fn parse_headers(raw: &[String]) -> Result<WebhookHeaders> {
    let mut headers = WebhookHeaders::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once(':') else {
            bail!("header '{entry}' is not in 'Name: value' form");
        };
        headers.insert(name.trim(), value.trim());
    }
    Ok(headers)
}

/// Reads a JSON payload from `path`, or from stdin when `path` is `-`.
pub fn read_payload(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read payload from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload {}", path.display()))?
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

// ---------------------------------------------------------------------------
// Remote operations
// ---------------------------------------------------------------------------

pub async fn resolve(adapter: &dyn ScmAdapter, token: &AccessToken, address: &str) -> Result<()> {
    let address = parse_address(address)?;
    print_json(&adapter.resolve_address(token, &address).await?)
}

pub async fn translate(adapter: &dyn ScmAdapter, token: &AccessToken, url: &str) -> Result<()> {
    let address = adapter.translate_checkout_url(token, url).await?;
    print_json(&json!({ "address": address.encode() }))
}

pub async fn latest_sha(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
) -> Result<()> {
    let address = parse_address(address)?;
    let sha = adapter.latest_commit_sha(token, &address).await?;
    print_json(&json!({ "sha": sha }))
}

pub async fn file(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    path: &str,
    git_ref: Option<&str>,
) -> Result<()> {
    let address = parse_address(address)?;
    let contents = adapter
        .file_contents(token, &address, path, git_ref)
        .await?;
    print!("{contents}");
    Ok(())
}

pub async fn pulls(adapter: &dyn ScmAdapter, token: &AccessToken, address: &str) -> Result<()> {
    let address = parse_address(address)?;
    print_json(&adapter.open_pull_requests(token, &address).await?)
}

pub async fn decorate(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    sha: &str,
) -> Result<()> {
    let address = parse_address(address)?;
    let sha = parse_sha(sha)?;
    print_json(&adapter.decorate_commit(token, &address, &sha).await?)
}

pub async fn author(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    name: &str,
    email: &str,
) -> Result<()> {
    print_json(&adapter.decorate_author(token, name, email).await?)
}

pub async fn permissions(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
) -> Result<()> {
    let address = parse_address(address)?;
    print_json(&adapter.permissions_for(token, &address).await?)
}

pub async fn status(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    sha: &str,
    update: StatusUpdate,
) -> Result<()> {
    let address = parse_address(address)?;
    let sha = parse_sha(sha)?;
    adapter
        .report_build_status(token, &address, &sha, &update)
        .await;
    // Best-effort: the breaker snapshot is the only evidence of failure.
    print_json(&json!({ "reported": update.status, "breaker": adapter.breaker_stats() }))
}

pub async fn register_hook(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    notify_url: &str,
) -> Result<()> {
    let address = parse_address(address)?;
    adapter
        .register_webhook(token, &address, notify_url)
        .await?;
    print_json(&json!({ "registered": notify_url }))
}

pub async fn unregister_hook(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    notify_url: &str,
) -> Result<()> {
    let address = parse_address(address)?;
    let removed = adapter
        .unregister_webhook(token, &address, notify_url)
        .await?;
    print_json(&json!({ "removed": removed }))
}

pub async fn checkout_script(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    sha: &str,
    pr_ref: Option<String>,
    credentials: CredentialMode,
) -> Result<()> {
    let address = parse_address(address)?;
    let request = CheckoutRequest {
        location: adapter.resolve_address(token, &address).await?,
        sha: parse_sha(sha)?,
        pr_ref,
        credentials,
    };
    print!("{}", adapter.build_checkout_script(&request)?);
    Ok(())
}

pub async fn changed_files(
    adapter: &dyn ScmAdapter,
    token: &AccessToken,
    address: &str,
    base: &str,
    head: &str,
) -> Result<()> {
    let address = parse_address(address)?;
    let files = adapter
        .changed_files(token, &address, &parse_sha(base)?, &parse_sha(head)?)
        .await?;
    print_json(&files)
}

// ---------------------------------------------------------------------------
// Local operations
// ---------------------------------------------------------------------------

/// Routes a stored delivery through the registry and prints the outcome.
pub fn webhook(registry: &ScmRegistry, headers: &WebhookHeaders, payload: &Value) -> Result<()> {
    let output = match registry.route_webhook(headers, payload) {
        Some((tag, event)) => json!({ "handledBy": tag, "event": event }),
        None => json!({ "handledBy": null, "event": null }),
    };
    print_json(&output)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
