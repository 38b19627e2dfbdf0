//! Dispatch table from [`IdentityTag`] to adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{CanonicalWebhookEvent, IdentityTag, ScmAdapter, ScmError, WebhookHeaders};

/// Adapters known to the orchestrator, keyed by identity tag.
///
/// Iteration (and therefore webhook routing) follows tag order, so routing is
/// deterministic when more than one adapter could accept a delivery.
#[derive(Default, Clone)]
pub struct ScmRegistry {
    adapters: BTreeMap<IdentityTag, Arc<dyn ScmAdapter>>,
}

impl ScmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an adapter under its own identity tag.
    ///
    /// Fails with [`ScmError::Configuration`] if the tag is already taken.
    pub fn register(&mut self, adapter: Arc<dyn ScmAdapter>) -> Result<(), ScmError> {
        let tag = adapter.identity_tag().clone();
        if self.adapters.contains_key(&tag) {
            return Err(ScmError::Configuration {
                message: format!("adapter '{tag}' registered twice"),
            });
        }
        tracing::debug!(tag = %tag, "adapter registered");
        self.adapters.insert(tag, adapter);
        Ok(())
    }

    pub fn get(&self, tag: &IdentityTag) -> Option<&Arc<dyn ScmAdapter>> {
        self.adapters.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &IdentityTag> {
        self.adapters.keys()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Finds the first adapter that accepts the delivery and returns its tag
    /// with the normalized event.
    ///
    /// Returns `None` when no adapter can handle it. Normalization errors are
    /// treated like a refusal.
    pub fn route_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &serde_json::Value,
    ) -> Option<(IdentityTag, CanonicalWebhookEvent)> {
        for (tag, adapter) in &self.adapters {
            if !adapter.can_handle_webhook(headers, payload) {
                continue;
            }
            match adapter.normalize_webhook(headers, payload) {
                Ok(Some(event)) => return Some((tag.clone(), event)),
                Ok(None) => {}
                Err(e) => tracing::debug!(tag = %tag, error = %e, "webhook rejected"),
            }
        }
        None
    }
}

impl std::fmt::Debug for ScmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScmRegistry")
            .field("tags", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
