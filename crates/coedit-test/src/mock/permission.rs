//! Grant-table permission double.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coedit_core::permission::{Intent, PermissionProvider, PermissionService, Resource};
use coedit_core::types::UserId;
use coedit_core::{Error, Result};

/// Permission double that answers from an explicit grant table.
///
/// Nothing is allowed until granted. Every check is counted, so tests can
/// assert that a decision was (or was not) requested.
#[derive(Debug, Clone, Default)]
pub struct MockPermissions {
    grants: Arc<Mutex<HashSet<(UserId, Intent, Resource)>>>,
    calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MockPermissions {
    /// Creates a double that denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a handle to this double into a [`PermissionService`].
    pub fn service(&self) -> PermissionService {
        PermissionService::new(self.clone())
    }

    /// Allows `user` to perform `intent` on `resource`.
    pub fn grant(&self, user: UserId, intent: Intent, resource: impl Into<Resource>) {
        self.grants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((user, intent, resource.into()));
    }

    /// Withdraws a grant.
    pub fn revoke(&self, user: UserId, intent: Intent, resource: impl Into<Resource>) {
        self.grants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(user, intent, resource.into()));
    }

    /// Makes every later check fail with an internal error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns how many checks were requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PermissionProvider for MockPermissions {
    async fn has_permission(
        &self,
        user: UserId,
        intent: Intent,
        resource: Resource,
    ) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::internal().with_message("permission backend unavailable"));
        }

        Ok(self
            .grants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(user, intent, resource)))
    }
}
