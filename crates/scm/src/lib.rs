//! Domain layer of scm-bridge.
//!
//! This crate holds every concept the build orchestrator and the provider
//! adapters share: newtype identifiers, the internal repository address codec,
//! the build-status and access-level tables, canonical webhook events,
//! checkout-script synthesis, and the [`ScmAdapter`] port trait. Provider
//! crates implement the trait; they add no domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* an SCM backend must supply; provider crates define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Hostname`, `RepositoryId`, `CommitSha`, etc.) |
//! | [`address`] | `RepositoryAddress` codec and checkout URL grammar |
//! | [`status`] | Build status → commit state table |
//! | [`permissions`] | Access level → capability table |
//! | [`webhook`] | Canonical webhook event and header map |
//! | [`checkout`] | Checkout script synthesis |
//! | [`types`] | Lookup results and breaker statistics |
//! | [`errors`] | `ScmError` and `RetryPolicy` |
//! | [`adapter`] | The `ScmAdapter` port |
//! | [`registry`] | Identity-tag dispatch |

pub mod adapter;
pub mod address;
pub mod checkout;
pub mod errors;
pub mod identifiers;
pub mod permissions;
pub mod registry;
pub mod status;
pub mod types;
pub mod webhook;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use adapter::{CheckoutRequest, ScmAdapter, StatusUpdate};
pub use address::{
    decode_address, encode_address, parse_checkout_url, CheckoutDescriptor, RepositoryAddress,
    ADDRESS_SEPARATOR, DEFAULT_BRANCH,
};
pub use checkout::{build_checkout_script, clone_url, CheckoutParams, CredentialMode};
pub use errors::{RetryPolicy, ScmError};
pub use identifiers::{
    AccessToken, BranchName, CommitSha, Hostname, IdentityTag, MergeRequestIid, RepositoryId,
};
pub use permissions::{map_access_level, AccessLevel, Capabilities};
pub use registry::ScmRegistry;
pub use status::{map_build_status, BuildStatus, CommitState, StatusReport};
pub use types::{
    AuthorDecoration, BreakerState, BreakerStats, ChangedFiles, CommitDecoration,
    PullRequestRef, Timestamp,
};
pub use webhook::{CanonicalWebhookEvent, EventType, WebhookAction, WebhookHeaders};
