//! scm-bridge CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load `.scm-bridge/config.toml` (or `--config`)
//!    and apply `--host`, `--token` and `--credential-mode` overrides.
//! 2. **Wire observability**: configure `tracing-subscriber` and, when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: build a [`gitlab::GitLabScm`] and register
//!    it in an [`scm::ScmRegistry`].
//! 4. **Run one operation**: each subcommand maps to one adapter operation and
//!    prints its result as JSON on stdout.

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitlab::GitLabScm;
use scm::{AccessToken, ScmAdapter, ScmRegistry, StatusUpdate};
use tracing::{debug, Level};

use crate::commands::CredentialModeArg;
use crate::config::FileConfig;

#[derive(Parser)]
#[command(name = "scm-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GitLab adapter operations for a build orchestrator", long_about = None)]
struct Cli {
    /// Config file (default: .scm-bridge/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitLab host, overriding the config file
    #[arg(long, global = true, env = "SCM_BRIDGE_HOST")]
    host: Option<String>,

    /// API token used for every remote call
    #[arg(long, global = true, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the adapter's identity tag and breaker state
    Identity,

    /// Recover owner and repository name for an internal address
    Resolve { address: String },

    /// Turn a checkout URL into an internal address
    Translate { url: String },

    /// Head commit of the address's branch
    LatestSha { address: String },

    /// Print a repository file
    File {
        address: String,
        path: String,
        /// Branch, tag or SHA (default: the address's branch)
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },

    /// List open merge requests
    Pulls { address: String },

    /// Commit metadata with its decorated author
    Decorate { address: String, sha: String },

    /// Match a commit author against GitLab accounts
    Author {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },

    /// Capabilities the token holder has on the repository
    Permissions { address: String },

    /// Report a build status on a commit (best-effort)
    Status {
        address: String,
        sha: String,
        /// SUCCESS, FAILURE, ABORTED, RUNNING or QUEUED
        status: String,
        #[arg(long)]
        target_url: String,
        /// Status name (default: the configured status context)
        #[arg(long)]
        job: Option<String>,
    },

    /// Create or update the webhook pointing at NOTIFY_URL
    RegisterHook { address: String, notify_url: String },

    /// Remove every webhook pointing at NOTIFY_URL
    UnregisterHook { address: String, notify_url: String },

    /// Print the shell script that checks out a commit
    CheckoutScript {
        address: String,
        sha: String,
        /// Merge request reference from a webhook event (e.g. merge_requests/42)
        #[arg(long)]
        pr_ref: Option<String>,
        #[arg(long, value_enum, env = "SCM_CREDENTIAL_MODE", default_value = "ssh")]
        credential_mode: CredentialModeArg,
    },

    /// Normalize a stored webhook delivery
    Webhook {
        /// JSON payload file, or - for stdin
        #[arg(long, default_value = "-")]
        payload: PathBuf,
        /// Delivery header as 'Name: value' (repeatable)
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,
    },

    /// Files changed between two commits
    ChangedFiles {
        address: String,
        base: String,
        head: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let _telemetry = telemetry::init(cli.json, level)?;

    let file_config = FileConfig::load(cli.config.as_deref())?;
    let gitlab_config = file_config.gitlab(cli.host.as_deref())?;
    let adapter: Arc<dyn ScmAdapter> = GitLabScm::from_config(gitlab_config)
        .context("failed to construct GitLab adapter")?
        .into_shared();

    let token = cli.token.as_deref().and_then(AccessToken::new);
    let require_token = || {
        token
            .clone()
            .context("this command needs an API token; pass --token or set GITLAB_TOKEN")
    };

    let result = match cli.command {
        Commands::Identity => commands::print_json(&serde_json::json!({
            "identityTag": adapter.identity_tag(),
            "breaker": adapter.breaker_stats(),
        })),
        Commands::Resolve { address } => {
            commands::resolve(adapter.as_ref(), &require_token()?, &address).await
        }
        Commands::Translate { url } => {
            commands::translate(adapter.as_ref(), &require_token()?, &url).await
        }
        Commands::LatestSha { address } => {
            commands::latest_sha(adapter.as_ref(), &require_token()?, &address).await
        }
        Commands::File {
            address,
            path,
            git_ref,
        } => {
            commands::file(
                adapter.as_ref(),
                &require_token()?,
                &address,
                &path,
                git_ref.as_deref(),
            )
            .await
        }
        Commands::Pulls { address } => {
            commands::pulls(adapter.as_ref(), &require_token()?, &address).await
        }
        Commands::Decorate { address, sha } => {
            commands::decorate(adapter.as_ref(), &require_token()?, &address, &sha).await
        }
        Commands::Author { name, email } => {
            commands::author(adapter.as_ref(), &require_token()?, &name, &email).await
        }
        Commands::Permissions { address } => {
            commands::permissions(adapter.as_ref(), &require_token()?, &address).await
        }
        Commands::Status {
            address,
            sha,
            status,
            target_url,
            job,
        } => {
            let update = StatusUpdate {
                status: commands::parse_status(&status),
                target_url,
                job_name: job,
            };
            commands::status(adapter.as_ref(), &require_token()?, &address, &sha, update).await
        }
        Commands::RegisterHook {
            address,
            notify_url,
        } => {
            commands::register_hook(adapter.as_ref(), &require_token()?, &address, &notify_url)
                .await
        }
        Commands::UnregisterHook {
            address,
            notify_url,
        } => {
            commands::unregister_hook(adapter.as_ref(), &require_token()?, &address, &notify_url)
                .await
        }
        Commands::CheckoutScript {
            address,
            sha,
            pr_ref,
            credential_mode,
        } => {
            let token = require_token()?;
            let credentials =
                credential_mode.resolve(&file_config.checkout.clone_username, Some(&token))?;
            commands::checkout_script(adapter.as_ref(), &token, &address, &sha, pr_ref, credentials)
                .await
        }
        Commands::Webhook { payload, headers } => {
            let headers = commands::parse_headers(&headers)?;
            let payload = commands::read_payload(&payload)?;
            let mut registry = ScmRegistry::new();
            registry.register(adapter.clone())?;
            commands::webhook(&registry, &headers, &payload)
        }
        Commands::ChangedFiles {
            address,
            base,
            head,
        } => {
            commands::changed_files(adapter.as_ref(), &require_token()?, &address, &base, &head)
                .await
        }
    };

    debug!(breaker = ?adapter.breaker_stats(), "done");
    result
}
