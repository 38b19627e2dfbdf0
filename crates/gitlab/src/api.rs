//! GitLab v4 REST paths and the response fields this adapter reads.
//!
//! Only the fields actually consumed are modelled; serde ignores the rest.

use scm::{AccessLevel, ScmError};
use serde::Deserialize;
use url::Url;

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Builds endpoint URLs below the configured API root.
///
/// Each segment is percent-encoded on its own, so `group/sub/repo` or a file
/// path like `ci/build.yml` becomes a single `%2F`-joined segment, as GitLab
/// expects for project paths, branch names and file paths.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ScmError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ScmError::Configuration {
                message: format!("API base '{}' cannot be a base URL", self.base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /projects/:id`, where `:id` is a numeric id or a full path.
    pub fn project(&self, project: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project])
    }

    pub fn hooks(&self, project: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project, "hooks"])
    }

    pub fn hook(&self, project: &str, hook_id: u64) -> Result<Url, ScmError> {
        self.url(&["projects", project, "hooks", &hook_id.to_string()])
    }

    pub fn branch(&self, project: &str, branch: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project, "repository", "branches", branch])
    }

    pub fn commit(&self, project: &str, sha: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project, "repository", "commits", sha])
    }

    pub fn file(&self, project: &str, path: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project, "repository", "files", path])
    }

    pub fn statuses(&self, project: &str, sha: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project, "statuses", sha])
    }

    pub fn merge_requests(&self, project: &str) -> Result<Url, ScmError> {
        self.url(&["projects", project, "merge_requests"])
    }

    pub fn users(&self) -> Result<Url, ScmError> {
        self.url(&["users"])
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u64,
    /// Repository name as it appears in URLs (last path segment).
    pub path: String,
    pub path_with_namespace: String,
    pub namespace: Namespace,
    pub web_url: String,
    #[serde(default)]
    pub permissions: Option<ProjectPermissions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Namespace {
    pub full_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPermissions {
    #[serde(default)]
    pub project_access: Option<AccessGrant>,
    #[serde(default)]
    pub group_access: Option<AccessGrant>,
}

impl ProjectPermissions {
    /// The stronger of the direct and inherited grants.
    pub fn effective_level(&self) -> AccessLevel {
        let level = |grant: &Option<AccessGrant>| grant.as_ref().map_or(0, |g| g.access_level);
        AccessLevel::new(level(&self.project_access).max(level(&self.group_access)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessGrant {
    pub access_level: u32,
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Hook {
    pub id: u64,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub commit: BranchCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub content: String,
    pub encoding: String,
}

// ---------------------------------------------------------------------------
// Users and merge requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub iid: u64,
    pub title: String,
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
