//! Newtype domain identifiers.
//!
//! Every value the orchestrator hands across the adapter boundary that has an
//! identity is represented as a distinct newtype wrapping a primitive. This
//! prevents accidentally interchanging, for example, a [`RepositoryId`] with a
//! [`BranchName`] even though both are strings under the hood.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (provider-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: provider-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Project-scoped number of a merge request (GitLab `iid`).
    ///
    /// Not globally unique: two projects can both have merge request `42`.
    MergeRequestIid
}

// ---------------------------------------------------------------------------
// Identifiers: string-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Host name of an SCM provider instance, optionally with a port
    /// (e.g. `"gitlab.com"`, `"git.internal:8443"`).
    Hostname
}

string_id! {
    /// Provider-opaque repository identifier.
    ///
    /// For GitLab this is the numeric project id rendered as a string. This
    /// layer never parses it further.
    RepositoryId
}

string_id! {
    /// A Git branch name (e.g. `"main"`, `"feature/login"`).
    BranchName
}

string_id! {
    /// A Git commit SHA.
    CommitSha
}

string_id! {
    /// Stable tag identifying one provider + host pairing (e.g.
    /// `"gitlab:gitlab.com"`).
    ///
    /// The orchestrator keys its adapter registry and its token store on this
    /// value.
    IdentityTag
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// API access token supplied by the orchestrator for a single operation.
///
/// `Debug` output is redacted so tokens never reach log lines.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token, returning `None` if it is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
