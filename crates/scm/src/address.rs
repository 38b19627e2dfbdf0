//! Internal repository addresses and external checkout URLs.
//!
//! The orchestrator never stores provider URLs. It stores a compact
//! [`RepositoryAddress`] (`hostname:repositoryId:branch`) and lets the adapter
//! translate to and from the provider's own addressing. Everything in this
//! module is pure, so addresses can be treated as plain values in tests.
//!
//! | Form | Example |
//! |------|---------|
//! | Internal address | `gitlab.com:1234:main` |
//! | Checkout URL | `https://gitlab.com/group/project.git#main` |

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{BranchName, Hostname, RepositoryId, ScmError};

/// Separator between the fields of an internal address.
pub const ADDRESS_SEPARATOR: char = ':';

/// Branch assumed when a checkout URL carries no `#branch` suffix.
pub const DEFAULT_BRANCH: &str = "master";

// ---------------------------------------------------------------------------
// Internal address
// ---------------------------------------------------------------------------

/// The orchestrator's compact identifier for one branch of one repository.
///
/// Invariant: neither `repository_id` nor `branch` contains
/// [`ADDRESS_SEPARATOR`], so [`RepositoryAddress::encode`] and
/// [`RepositoryAddress::decode`] round-trip losslessly. The hostname may carry
/// a port (`host:8443`); decoding splits from the right to keep it intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryAddress {
    hostname: Hostname,
    repository_id: RepositoryId,
    branch: BranchName,
}

impl RepositoryAddress {
    /// Builds an address, rejecting empty fields and separator characters in
    /// the repository id or branch.
    pub fn new(hostname: &str, repository_id: &str, branch: &str) -> Result<Self, ScmError> {
        for (field, value) in [("repositoryId", repository_id), ("branch", branch)] {
            if value.contains(ADDRESS_SEPARATOR) {
                return Err(malformed(
                    value,
                    format!("{field} must not contain '{ADDRESS_SEPARATOR}'"),
                ));
            }
        }

        let hostname = Hostname::new(hostname).ok_or_else(|| malformed("", "empty hostname"))?;
        let repository_id = RepositoryId::new(repository_id)
            .ok_or_else(|| malformed(hostname.as_str(), "empty repositoryId"))?;
        let branch = BranchName::new(branch)
            .ok_or_else(|| malformed(hostname.as_str(), "empty branch"))?;

        Ok(Self {
            hostname,
            repository_id,
            branch,
        })
    }

    /// Parses the `hostname:repositoryId:branch` form.
    pub fn decode(address: &str) -> Result<Self, ScmError> {
        let mut parts = address.rsplitn(3, ADDRESS_SEPARATOR);
        let (Some(branch), Some(repository_id), Some(hostname)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed(address, "expected hostname:repositoryId:branch"));
        };

        Self::new(hostname, repository_id, branch)
            .map_err(|_| malformed(address, "expected three non-empty fields"))
    }

    /// Renders the `hostname:repositoryId:branch` form.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.hostname,
            self.repository_id,
            self.branch,
            sep = ADDRESS_SEPARATOR
        )
    }

    /// Returns a copy of this address pointing at a different branch.
    pub fn with_branch(&self, branch: &str) -> Result<Self, ScmError> {
        Self::new(
            self.hostname.as_str(),
            self.repository_id.as_str(),
            branch,
        )
    }

    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    pub fn repository_id(&self) -> &RepositoryId {
        &self.repository_id
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }
}

impl std::fmt::Display for RepositoryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for RepositoryAddress {
    type Err = ScmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for RepositoryAddress {
    type Error = ScmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<RepositoryAddress> for String {
    fn from(address: RepositoryAddress) -> Self {
        address.encode()
    }
}

/// Joins the three fields into an internal address string.
pub fn encode_address(
    hostname: &str,
    repository_id: &str,
    branch: &str,
) -> Result<String, ScmError> {
    RepositoryAddress::new(hostname, repository_id, branch).map(|a| a.encode())
}

/// Splits an internal address string into its fields.
pub fn decode_address(address: &str) -> Result<RepositoryAddress, ScmError> {
    RepositoryAddress::decode(address)
}

fn malformed(address: &str, reason: impl Into<String>) -> ScmError {
    ScmError::MalformedAddress {
        address: address.to_string(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Checkout URL
// ---------------------------------------------------------------------------

// protocol://[userinfo@]host/owner[/subgroup...]/repo[.git][#branch]
#[allow(clippy::expect_used)]
static CHECKOUT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<protocol>[A-Za-z][A-Za-z0-9+.-]*)://(?:[^@/]+@)?(?P<host>[^/#]+)/(?P<owner>[^#]+)/(?P<repo>[^/#]+?)(?:\.git)?(?:#(?P<branch>[^#]+))?$",
    )
    .expect("constant regex pattern is valid")
});

/// Owner, repository and branch named by a checkout URL.
///
/// `owner` is the full namespace path and may itself contain `/` for nested
/// groups; `reponame` is always the last path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDescriptor {
    pub hostname: Hostname,
    pub owner: String,
    pub reponame: String,
    pub branch: BranchName,
}

impl CheckoutDescriptor {
    /// Matches `url` against the checkout URL grammar.
    ///
    /// `default_branch` is used when the URL has no `#branch` suffix.
    pub fn parse(url: &str, default_branch: &str) -> Result<Self, ScmError> {
        let unsupported = || ScmError::UnsupportedUrl {
            url: url.to_string(),
        };

        let caps = CHECKOUT_URL.captures(url.trim()).ok_or_else(unsupported)?;
        let hostname = Hostname::new(&caps["host"]).ok_or_else(unsupported)?;
        let owner = caps["owner"].trim_matches('/').to_string();
        if owner.is_empty() {
            return Err(unsupported());
        }
        let branch = caps
            .name("branch")
            .map_or(default_branch, |m| m.as_str());
        let branch = BranchName::new(branch).ok_or_else(unsupported)?;

        Ok(Self {
            hostname,
            owner,
            reponame: caps["repo"].to_string(),
            branch,
        })
    }

    /// Like [`CheckoutDescriptor::parse`], additionally requiring the URL host to
    /// equal `expected_host` (case-insensitive).
    pub fn parse_for_host(
        url: &str,
        expected_host: &Hostname,
        default_branch: &str,
    ) -> Result<Self, ScmError> {
        let descriptor = Self::parse(url, default_branch)?;
        if !descriptor
            .hostname
            .as_str()
            .eq_ignore_ascii_case(expected_host.as_str())
        {
            return Err(ScmError::HostMismatch {
                expected: expected_host.to_string(),
                actual: descriptor.hostname.to_string(),
            });
        }
        Ok(descriptor)
    }

    /// `owner/reponame`, the provider's path for this repository.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.owner, self.reponame)
    }
}

/// Parses a checkout URL, defaulting the branch to [`DEFAULT_BRANCH`].
pub fn parse_checkout_url(url: &str) -> Result<CheckoutDescriptor, ScmError> {
    CheckoutDescriptor::parse(url, DEFAULT_BRANCH)
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
