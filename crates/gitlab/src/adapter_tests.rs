use scm::{
    BreakerState, BuildStatus, CredentialMode, EventType, ScmRegistry, WebhookAction,
};
use serde_json::json;

use super::*;
use crate::fake::FakeTransport;
use crate::transport::{HttpMethod, RawResponse, TransportError};
use crate::BreakerConfig;

const PROJECT: &str = "/api/v4/projects/42";

fn adapter_with(config: GitLabConfig) -> (GitLabScm<FakeTransport>, FakeTransport) {
    let fake = FakeTransport::new();
    let adapter = GitLabScm::with_transport(config, fake.clone()).unwrap();
    (adapter, fake)
}

fn adapter() -> (GitLabScm<FakeTransport>, FakeTransport) {
    adapter_with(GitLabConfig::new("gitlab.example"))
}

fn token() -> AccessToken {
    AccessToken::new("glpat-test").unwrap()
}

fn address() -> RepositoryAddress {
    RepositoryAddress::new("gitlab.example", "42", "main").unwrap()
}

fn project_json() -> Value {
    json!({
        "id": 42,
        "path": "widgets",
        "path_with_namespace": "acme/widgets",
        "namespace": { "full_path": "acme" },
        "web_url": "https://gitlab.example/acme/widgets",
        "permissions": {
            "project_access": { "access_level": 20 },
            "group_access": { "access_level": 40 }
        }
    })
}

fn push_headers() -> WebhookHeaders {
    [("X-Gitlab-Event", "Push Hook")].into_iter().collect()
}

fn push_payload() -> Value {
    json!({
        "object_kind": "push",
        "event_name": "push",
        "user_name": "alice",
        "project": { "git_http_url": "https://gitlab.example/acme/widgets.git" },
        "ref": "refs/heads/main",
        "checkout_sha": "abc123",
        "commits": [{ "message": "fix bug" }]
    })
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn identity_tag_names_provider_and_host() {
    let (adapter, _) = adapter();
    assert_eq!(adapter.identity_tag().as_str(), "gitlab:gitlab.example");
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let mut config = GitLabConfig::new("gitlab.example");
    config.breaker.failure_threshold = 0;
    let result = GitLabScm::with_transport(config, FakeTransport::new());
    assert!(matches!(result, Err(ScmError::Configuration { .. })));
}

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn translate_checkout_url_composes_internal_address() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, "/api/v4/projects/acme%2Fwidgets", 200, project_json());

    let address = adapter
        .translate_checkout_url(&token(), "https://gitlab.example/acme/widgets.git#develop")
        .await
        .unwrap();
    assert_eq!(address.encode(), "gitlab.example:42:develop");

    let address = adapter
        .translate_checkout_url(&token(), "https://gitlab.example/acme/widgets")
        .await
        .unwrap();
    assert_eq!(address.branch().as_str(), "master");
}

#[tokio::test]
async fn translate_checkout_url_supports_nested_groups() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/acme%2Ftools%2Fwidgets",
        200,
        project_json(),
    );
    let address = adapter
        .translate_checkout_url(&token(), "https://gitlab.example/acme/tools/widgets.git")
        .await
        .unwrap();
    assert_eq!(address.repository_id().as_str(), "42");
}

#[tokio::test]
async fn translate_checkout_url_rejects_other_hosts_without_calling_out() {
    let (adapter, fake) = adapter();
    let err = adapter
        .translate_checkout_url(&token(), "https://gitlab.com/acme/widgets.git")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ScmError::HostMismatch {
            expected: "gitlab.example".into(),
            actual: "gitlab.com".into()
        }
    );
    assert_eq!(fake.request_count(), 0);
}

#[tokio::test]
async fn translate_checkout_url_rejects_unsupported_shapes() {
    let (adapter, _) = adapter();
    let err = adapter
        .translate_checkout_url(&token(), "gitlab.example:acme/widgets")
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::UnsupportedUrl { .. }));
}

#[tokio::test]
async fn resolve_address_recovers_owner_and_repo() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project_json());

    let descriptor = adapter.resolve_address(&token(), &address()).await.unwrap();
    assert_eq!(descriptor.owner, "acme");
    assert_eq!(descriptor.reponame, "widgets");
    assert_eq!(descriptor.branch.as_str(), "main");
    assert_eq!(descriptor.hostname.as_str(), "gitlab.example");
}

// ---------------------------------------------------------------------------
// Webhook registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_webhook_creates_when_absent() {
    let mut config = GitLabConfig::new("gitlab.example");
    config.webhook_secret = Some("s3cret".into());
    let (adapter, fake) = adapter_with(config);
    fake.respond_json(HttpMethod::Get, "/api/v4/projects/42/hooks", 200, json!([]));
    fake.respond_json(HttpMethod::Post, "/api/v4/projects/42/hooks", 201, json!({ "id": 1 }));

    adapter
        .register_webhook(&token(), &address(), "https://ci.example/hook")
        .await
        .unwrap();

    let posts = fake.requests_to(HttpMethod::Post, "/api/v4/projects/42/hooks");
    assert_eq!(posts.len(), 1);
    let body = posts[0].body.as_ref().unwrap();
    assert_eq!(body["url"], "https://ci.example/hook");
    assert_eq!(body["push_events"], true);
    assert_eq!(body["merge_requests_events"], true);
    assert_eq!(body["token"], "s3cret");
}

#[tokio::test]
async fn register_webhook_updates_existing_hook_in_place() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/hooks",
        200,
        json!([
            { "id": 3, "url": "https://other.example/hook" },
            { "id": 9, "url": "https://ci.example/hook" }
        ]),
    );
    fake.respond_json(HttpMethod::Put, "/api/v4/projects/42/hooks/9", 200, json!({ "id": 9 }));

    for _ in 0..2 {
        adapter
            .register_webhook(&token(), &address(), "https://ci.example/hook")
            .await
            .unwrap();
    }

    assert_eq!(
        fake.requests_to(HttpMethod::Put, "/api/v4/projects/42/hooks/9").len(),
        2
    );
    assert!(fake
        .requests_to(HttpMethod::Post, "/api/v4/projects/42/hooks")
        .is_empty());
}

fn numbered_hooks(ids: std::ops::Range<u64>) -> Value {
    ids.map(|id| json!({ "id": id, "url": format!("https://other.example/{id}") }))
        .collect()
}

#[tokio::test]
async fn register_webhook_finds_existing_hook_past_the_first_page() {
    let (adapter, fake) = adapter();
    fake.respond_page(HttpMethod::Get, "/api/v4/projects/42/hooks", 1, numbered_hooks(1..101));
    fake.respond_page(
        HttpMethod::Get,
        "/api/v4/projects/42/hooks",
        2,
        json!([{ "id": 200, "url": "https://ci.example/hook" }]),
    );
    fake.respond_json(HttpMethod::Put, "/api/v4/projects/42/hooks/200", 200, json!({ "id": 200 }));

    adapter
        .register_webhook(&token(), &address(), "https://ci.example/hook")
        .await
        .unwrap();

    let listed = fake.requests_to(HttpMethod::Get, "/api/v4/projects/42/hooks");
    assert_eq!(listed.len(), 2);
    assert!(listed[1]
        .query
        .contains(&("page".to_string(), "2".to_string())));
    assert_eq!(
        fake.requests_to(HttpMethod::Put, "/api/v4/projects/42/hooks/200").len(),
        1
    );
    assert!(fake
        .requests_to(HttpMethod::Post, "/api/v4/projects/42/hooks")
        .is_empty());
}

#[tokio::test]
async fn unregister_webhook_removes_every_match() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/hooks",
        200,
        json!([
            { "id": 1, "url": "https://ci.example/hook" },
            { "id": 2, "url": "https://other.example/hook" },
            { "id": 3, "url": "https://ci.example/hook" }
        ]),
    );
    fake.respond(HttpMethod::Delete, "/api/v4/projects/42/hooks/1", RawResponse::empty(204));
    fake.respond(HttpMethod::Delete, "/api/v4/projects/42/hooks/3", RawResponse::empty(204));

    let removed = adapter
        .unregister_webhook(&token(), &address(), "https://ci.example/hook")
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert!(fake
        .requests_to(HttpMethod::Delete, "/api/v4/projects/42/hooks/2")
        .is_empty());
}

// ---------------------------------------------------------------------------
// Repository reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_commit_sha_reads_branch_head() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/branches/main",
        200,
        json!({ "name": "main", "commit": { "id": "abc123" } }),
    );
    let sha = adapter.latest_commit_sha(&token(), &address()).await.unwrap();
    assert_eq!(sha.as_str(), "abc123");

    let sent = fake.requests();
    assert_eq!(
        sent[0].bearer_token.as_ref().map(AccessToken::expose),
        Some("glpat-test")
    );
}

#[tokio::test]
async fn file_contents_decodes_base64_at_branch_by_default() {
    let (adapter, fake) = adapter();
    let path = "/api/v4/projects/42/repository/files/ci%2Fbuild.yml";
    fake.respond_json(
        HttpMethod::Get,
        path,
        200,
        json!({ "encoding": "base64", "content": "aGVsbG8g\nd29ybGQK" }),
    );

    let text = adapter
        .file_contents(&token(), &address(), "ci/build.yml", None)
        .await
        .unwrap();
    assert_eq!(text, "hello world\n");

    adapter
        .file_contents(&token(), &address(), "ci/build.yml", Some("v1.2"))
        .await
        .unwrap();
    let refs: Vec<_> = fake
        .requests_to(HttpMethod::Get, path)
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(
        refs,
        vec![
            vec![("ref".to_string(), "main".to_string())],
            vec![("ref".to_string(), "v1.2".to_string())],
        ]
    );
}

#[tokio::test]
async fn file_contents_rejects_corrupt_base64() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/files/README.md",
        200,
        json!({ "encoding": "base64", "content": "!!!" }),
    );
    let err = adapter
        .file_contents(&token(), &address(), "README.md", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::InvalidResponse { .. }));
}

#[tokio::test]
async fn open_pull_requests_lists_merge_request_refs() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/merge_requests",
        200,
        json!([
            { "iid": 7, "title": "Add login" },
            { "iid": 8, "title": "Fix logout" }
        ]),
    );
    let prs = adapter.open_pull_requests(&token(), &address()).await.unwrap();
    assert_eq!(
        prs,
        vec![
            PullRequestRef {
                name: "Add login".into(),
                git_ref: "merge_requests/7".into(),
                number: MergeRequestIid::new(7),
            },
            PullRequestRef {
                name: "Fix logout".into(),
                git_ref: "merge_requests/8".into(),
                number: MergeRequestIid::new(8),
            },
        ]
    );
    let sent = fake.requests_to(HttpMethod::Get, "/api/v4/projects/42/merge_requests");
    assert!(sent[0]
        .query
        .contains(&("state".to_string(), "opened".to_string())));
}

// ---------------------------------------------------------------------------
// Decoration and permissions
// ---------------------------------------------------------------------------

fn commit_json(author_name: Option<&str>) -> Value {
    json!({
        "id": "abc123",
        "message": "fix bug\n\nlonger body",
        "author_name": author_name,
        "author_email": "alice@example.com",
        "web_url": "https://gitlab.example/acme/widgets/-/commit/abc123"
    })
}

#[tokio::test]
async fn decorate_commit_joins_commit_and_author() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project_json());
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/commits/abc123",
        200,
        commit_json(Some("Alice")),
    );
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/users",
        200,
        json!([{ "username": "alice", "avatar_url": "https://gitlab.example/a.png" }]),
    );

    let sha = CommitSha::new("abc123").unwrap();
    let decoration = adapter
        .decorate_commit(&token(), &address(), &sha)
        .await
        .unwrap();
    assert_eq!(decoration.message, "fix bug\n\nlonger body");
    assert_eq!(
        decoration.url,
        "https://gitlab.example/acme/widgets/-/commit/abc123"
    );
    assert_eq!(decoration.author.name, "Alice");
    assert_eq!(decoration.author.username.as_deref(), Some("alice"));

    let searches = fake.requests_to(HttpMethod::Get, "/api/v4/users");
    assert_eq!(
        searches[0].query,
        vec![("search".to_string(), "alice@example.com".to_string())]
    );
}

#[tokio::test]
async fn decorate_commit_without_author_uses_placeholder() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project_json());
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/commits/abc123",
        200,
        commit_json(None),
    );

    let sha = CommitSha::new("abc123").unwrap();
    let decoration = adapter
        .decorate_commit(&token(), &address(), &sha)
        .await
        .unwrap();
    assert_eq!(decoration.author, AuthorDecoration::placeholder());
    assert!(fake.requests_to(HttpMethod::Get, "/api/v4/users").is_empty());
}

#[tokio::test]
async fn decorate_commit_with_web_url_skips_project_lookup() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 403, json!({ "message": "403 Forbidden" }));
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/commits/abc123",
        200,
        commit_json(Some("Alice")),
    );
    fake.respond_json(HttpMethod::Get, "/api/v4/users", 200, json!([]));

    let sha = CommitSha::new("abc123").unwrap();
    let decoration = adapter
        .decorate_commit(&token(), &address(), &sha)
        .await
        .unwrap();
    assert_eq!(
        decoration.url,
        "https://gitlab.example/acme/widgets/-/commit/abc123"
    );
    assert!(fake.requests_to(HttpMethod::Get, PROJECT).is_empty());
}

#[tokio::test]
async fn decorate_commit_builds_url_from_project_when_missing() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project_json());
    let mut commit = commit_json(None);
    commit.as_object_mut().unwrap().remove("web_url");
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/commits/abc123",
        200,
        commit,
    );

    let sha = CommitSha::new("abc123").unwrap();
    let decoration = adapter
        .decorate_commit(&token(), &address(), &sha)
        .await
        .unwrap();
    assert_eq!(
        decoration.url,
        "https://gitlab.example/acme/widgets/-/commit/abc123"
    );
}

#[tokio::test]
async fn decorate_commit_fails_when_commit_lookup_fails() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project_json());
    // Commit lookup is unscripted and answers 404.
    let sha = CommitSha::new("abc123").unwrap();
    let err = adapter
        .decorate_commit(&token(), &address(), &sha)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScmError::RemoteRejected {
            status_code: 404,
            ..
        }
    ));
}

#[tokio::test]
async fn decorate_author_keeps_commit_identity_when_no_account_matches() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, "/api/v4/users", 200, json!([]));
    let author = adapter
        .decorate_author(&token(), "Carol", "carol@example.com")
        .await
        .unwrap();
    assert_eq!(author.name, "Carol");
    assert_eq!(author.email, "carol@example.com");
    assert_eq!(author.username, None);
}

#[tokio::test]
async fn permissions_use_stronger_of_project_and_group_access() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project_json());
    let caps = adapter.permissions_for(&token(), &address()).await.unwrap();
    assert_eq!(
        caps,
        Capabilities {
            pull: true,
            push: true,
            admin: true
        }
    );
}

#[tokio::test]
async fn permissions_without_grants_are_empty() {
    let (adapter, fake) = adapter();
    let mut project = project_json();
    project.as_object_mut().unwrap().remove("permissions");
    fake.respond_json(HttpMethod::Get, PROJECT, 200, project);
    let caps = adapter.permissions_for(&token(), &address()).await.unwrap();
    assert_eq!(caps, Capabilities::default());
}

// ---------------------------------------------------------------------------
// Build status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_build_status_posts_mapped_state() {
    let (adapter, fake) = adapter();
    let path = "/api/v4/projects/42/statuses/abc123";
    fake.respond_json(HttpMethod::Post, path, 201, json!({ "id": 1 }));

    let update = StatusUpdate {
        status: BuildStatus::Running,
        target_url: "https://ci.example/builds/1".into(),
        job_name: None,
    };
    let sha = CommitSha::new("abc123").unwrap();
    adapter
        .report_build_status(&token(), &address(), &sha, &update)
        .await;

    let posts = fake.requests_to(HttpMethod::Post, path);
    let body = posts[0].body.as_ref().unwrap();
    assert_eq!(body["state"], "pending");
    assert_eq!(body["description"], "Testing your code...");
    assert_eq!(body["name"], "scm-bridge");
    assert_eq!(body["target_url"], "https://ci.example/builds/1");
}

#[tokio::test]
async fn report_build_status_swallows_server_errors_that_other_calls_surface() {
    let (adapter, fake) = adapter();
    fake.respond_json(
        HttpMethod::Post,
        "/api/v4/projects/42/statuses/abc123",
        500,
        json!({ "message": "500 Internal Server Error" }),
    );
    fake.respond_json(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/branches/main",
        500,
        json!({ "message": "500 Internal Server Error" }),
    );

    let update = StatusUpdate {
        status: BuildStatus::Success,
        target_url: "https://ci.example/builds/1".into(),
        job_name: Some("unit".into()),
    };
    let sha = CommitSha::new("abc123").unwrap();
    adapter
        .report_build_status(&token(), &address(), &sha, &update)
        .await;

    let err = adapter
        .latest_commit_sha(&token(), &address())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ScmError::RemoteRejected {
            status_code: 500,
            reason: "500 Internal Server Error".into()
        }
    );
}

#[tokio::test]
async fn report_build_status_survives_an_open_breaker() {
    let mut config = GitLabConfig::new("gitlab.example");
    config.breaker = BreakerConfig {
        failure_threshold: 1,
        cool_down_ms: 60_000,
    };
    let (adapter, fake) = adapter_with(config);
    fake.fail(
        HttpMethod::Get,
        "/api/v4/projects/42/repository/branches/main",
        TransportError::Timeout,
    );
    assert_eq!(
        adapter.latest_commit_sha(&token(), &address()).await,
        Err(ScmError::Timeout)
    );
    assert_eq!(adapter.breaker_stats().state, BreakerState::Open);

    let update = StatusUpdate {
        status: BuildStatus::Failure,
        target_url: "https://ci.example/builds/1".into(),
        job_name: None,
    };
    let sha = CommitSha::new("abc123").unwrap();
    adapter
        .report_build_status(&token(), &address(), &sha, &update)
        .await;
    assert_eq!(fake.request_count(), 1);
}

// ---------------------------------------------------------------------------
// Breaker across operations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_outages_open_the_shared_breaker() {
    let (adapter, fake) = adapter();
    fake.respond_json(HttpMethod::Get, PROJECT, 503, json!({ "message": "maintenance" }));

    for _ in 0..5 {
        adapter.resolve_address(&token(), &address()).await.unwrap_err();
    }
    let stats = adapter.breaker_stats();
    assert_eq!(stats.state, BreakerState::Open);
    assert_eq!(stats.failure_count, 5);

    let err = adapter.permissions_for(&token(), &address()).await.unwrap_err();
    assert!(matches!(err, ScmError::CircuitOpen { .. }));
    assert!(err.retry_policy() != scm::RetryPolicy::NonRetryable);
    assert_eq!(fake.request_count(), 5);
}

// ---------------------------------------------------------------------------
// Checkout script and changed files
// ---------------------------------------------------------------------------

#[test]
fn checkout_script_for_merge_request_fetches_gitlab_ref() {
    let (adapter, _) = adapter();
    let request = CheckoutRequest {
        location: CheckoutDescriptor {
            hostname: Hostname::new("gitlab.example").unwrap(),
            owner: "acme".into(),
            reponame: "widgets".into(),
            branch: scm::BranchName::new("main").unwrap(),
        },
        sha: CommitSha::new("def456").unwrap(),
        pr_ref: Some("merge_requests/42".into()),
        credentials: CredentialMode::Ssh,
    };
    let script = adapter.build_checkout_script(&request).unwrap();
    assert!(script.contains("ssh://git@gitlab.example/acme/widgets.git"));
    assert!(script.contains("git reset --hard main\n"));
    assert!(script.contains("git fetch origin refs/merge-requests/42/head\n"));
}

#[tokio::test]
async fn changed_files_is_always_unknown() {
    let (adapter, fake) = adapter();
    let base = CommitSha::new("aaa").unwrap();
    let head = CommitSha::new("bbb").unwrap();
    let files = adapter
        .changed_files(&token(), &address(), &base, &head)
        .await
        .unwrap();
    assert_eq!(files, ChangedFiles::Unknown);
    assert_ne!(files, ChangedFiles::Known(Vec::new()));
    assert_eq!(fake.request_count(), 0);
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

#[test]
fn can_handle_signed_actionable_push() {
    let (adapter, _) = adapter();
    assert!(adapter.can_handle_webhook(&push_headers(), &push_payload()));
}

#[test]
fn cannot_handle_without_event_header() {
    let (adapter, _) = adapter();
    assert!(!adapter.can_handle_webhook(&WebhookHeaders::new(), &push_payload()));
}

#[test]
fn cannot_handle_malformed_or_unactionable_payloads() {
    let (adapter, _) = adapter();
    let malformed = json!({ "object_kind": "push", "event_name": "push" });
    assert!(!adapter.can_handle_webhook(&push_headers(), &malformed));
    let note = json!({ "object_kind": "note" });
    assert!(!adapter.can_handle_webhook(&push_headers(), &note));
}

#[test]
fn configured_secret_gates_handling() {
    let mut config = GitLabConfig::new("gitlab.example");
    config.webhook_secret = Some("s3cret".into());
    let (adapter, _) = adapter_with(config);

    assert!(!adapter.can_handle_webhook(&push_headers(), &push_payload()));
    let mut headers = push_headers();
    headers.insert("x-gitlab-token", "s3cret");
    assert!(adapter.can_handle_webhook(&headers, &push_payload()));
}

#[test]
fn registry_routes_webhooks_to_the_accepting_adapter() {
    let (adapter, _) = adapter();
    let mut registry = ScmRegistry::new();
    registry.register(adapter.into_shared()).unwrap();

    let (tag, event) = registry
        .route_webhook(&push_headers(), &push_payload())
        .unwrap();
    assert_eq!(tag.as_str(), "gitlab:gitlab.example");
    assert_eq!(event.event_type, EventType::Repo);
    assert_eq!(event.action, WebhookAction::Push);

    assert!(registry
        .route_webhook(&WebhookHeaders::new(), &push_payload())
        .is_none());
}

#[test]
fn registry_rejects_duplicate_tags() {
    let mut registry = ScmRegistry::new();
    registry.register(adapter().0.into_shared()).unwrap();
    let err = registry.register(adapter().0.into_shared()).unwrap_err();
    assert!(matches!(err, ScmError::Configuration { .. }));
    assert_eq!(registry.len(), 1);
}
