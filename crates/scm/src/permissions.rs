//! Provider access level → capability set.
//!
//! GitLab grades project membership on a numeric scale (10 guest, 20 reporter,
//! 30 developer, 40 maintainer, 50 owner). The orchestrator only cares about
//! three capabilities. Tiers are cumulative: each threshold grants everything
//! the tiers below it grant, so the mapping is monotonic in the level.

use serde::{Deserialize, Serialize};

/// Numeric access level as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessLevel(u32);

impl AccessLevel {
    pub const NONE: AccessLevel = AccessLevel(0);
    pub const GUEST: AccessLevel = AccessLevel(10);
    pub const REPORTER: AccessLevel = AccessLevel(20);
    pub const DEVELOPER: AccessLevel = AccessLevel(30);
    pub const MAINTAINER: AccessLevel = AccessLevel(40);
    pub const OWNER: AccessLevel = AccessLevel(50);

    pub fn new(level: u32) -> Self {
        Self(level)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// What the current credentials may do with a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub pull: bool,
    pub push: bool,
    pub admin: bool,
}

impl Capabilities {
    /// Returns `true` if every capability granted by `self` is also granted by
    /// `other`.
    pub fn is_subset_of(self, other: Capabilities) -> bool {
        (!self.pull || other.pull) && (!self.push || other.push) && (!self.admin || other.admin)
    }
}

/// Maps a provider access level onto the capability set.
pub fn map_access_level(level: AccessLevel) -> Capabilities {
    let mut caps = Capabilities::default();
    // Cumulative tiers: each branch also grants what the ones below it grant.
    if level >= AccessLevel::MAINTAINER {
        caps.admin = true;
    }
    if level >= AccessLevel::DEVELOPER {
        caps.push = true;
    }
    if level >= AccessLevel::REPORTER {
        caps.pull = true;
    }
    caps
}

#[cfg(test)]
#[path = "permissions_tests.rs"]
mod tests;
