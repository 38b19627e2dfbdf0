//! Shell script that checks a repository out at a given commit.
//!
//! The orchestrator runs the returned text in a fresh build directory. The
//! credential strategy is chosen by the caller through [`CredentialMode`], so
//! synthesis is pure and does not consult the process environment.
//!
//! Shape of the generated script:
//!
//! ```text
//! set -e
//! git clone --branch <branch> <url> .
//! git reset --hard <sha>            # or <branch> for merge request builds
//! git fetch origin <pr fetch ref>   # merge request builds only
//! git merge --no-edit FETCH_HEAD    # merge request builds only
//! ```

use std::borrow::Cow;

use serde::Deserialize;
use url::Url;

use crate::{AccessToken, BranchName, CommitSha, Hostname, ScmError};

/// How the build machine authenticates the clone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CredentialMode {
    /// `ssh://git@host/...`; relies on a key installed on the build machine.
    Ssh,
    /// HTTPS with `username:token` embedded in the clone URL.
    Token {
        username: String,
        token: AccessToken,
    },
    /// Plain HTTPS, for public repositories.
    Anonymous,
}

/// Everything needed to synthesise one checkout script.
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub hostname: Hostname,
    pub owner: String,
    pub reponame: String,
    pub branch: BranchName,
    pub sha: CommitSha,
    /// Fully qualified ref to fetch and merge for merge request builds
    /// (e.g. `refs/merge-requests/42/head`).
    pub pr_fetch_ref: Option<String>,
    pub credentials: CredentialMode,
}

/// Identity recorded on the local merge commit of a merge request build.
const MERGE_USER_NAME: &str = "scm-bridge";
const MERGE_USER_EMAIL: &str = "scm-bridge@localhost";

/// Builds the clone URL for the selected credential strategy.
pub fn clone_url(params: &CheckoutParams) -> Result<String, ScmError> {
    let path = format!("{}/{}.git", params.owner, params.reponame);
    match &params.credentials {
        CredentialMode::Ssh => Ok(format!("ssh://git@{}/{path}", params.hostname)),
        CredentialMode::Anonymous => Ok(format!("https://{}/{path}", params.hostname)),
        CredentialMode::Token { username, token } => {
            let raw = format!("https://{}/{path}", params.hostname);
            let unsupported = || ScmError::UnsupportedUrl { url: raw.clone() };
            let mut url = Url::parse(&raw).map_err(|_| unsupported())?;
            // Percent-encodes characters that are not valid in userinfo.
            url.set_username(username).map_err(|_| unsupported())?;
            url.set_password(Some(token.expose()))
                .map_err(|_| unsupported())?;
            Ok(url.to_string())
        }
    }
}

/// Renders the checkout script.
///
/// The script embeds the token for [`CredentialMode::Token`]; callers must not
/// log it.
pub fn build_checkout_script(params: &CheckoutParams) -> Result<String, ScmError> {
    let url = clone_url(params)?;
    let branch = quote(params.branch.as_str());

    let mut lines = vec![
        "set -e".to_string(),
        format!("git clone --branch {branch} {} .", quote(&url)),
    ];

    match &params.pr_fetch_ref {
        Some(fetch_ref) => {
            // Merge target first, then the merge request on top of it.
            lines.push(format!("git reset --hard {branch}"));
            lines.push(format!("git fetch origin {}", quote(fetch_ref)));
            lines.push(format!(
                "git -c user.name={} -c user.email={} merge --no-edit FETCH_HEAD",
                quote(MERGE_USER_NAME),
                quote(MERGE_USER_EMAIL)
            ));
        }
        None => lines.push(format!("git reset --hard {}", quote(params.sha.as_str()))),
    }

    Ok(lines.join("\n") + "\n")
}

fn quote(value: &str) -> Cow<'_, str> {
    shell_escape::escape(Cow::Borrowed(value))
}

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;
