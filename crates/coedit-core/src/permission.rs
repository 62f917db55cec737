//! Contract of the host permission model.
//!
//! The host decides; coedit only asks. Decisions are requested per operation
//! and never cached, since permissions can change between two calls.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::Result;
use crate::types::{ArtifactId, ContainerId, UserId};

/// Tracing target for permission checks.
pub const TRACING_TARGET: &str = "coedit_core::permission";

/// What a principal intends to do with a resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Read the artifact bytes or open it read-only.
    View,
    /// Write a new version of the artifact.
    Edit,
    /// Add a new artifact to a container.
    Create,
}

impl Intent {
    /// Returns the intent of an artifact access check.
    pub fn for_artifact(for_edit: bool) -> Self {
        if for_edit { Self::Edit } else { Self::View }
    }
}

/// Resource a permission is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Resource {
    /// A stored artifact.
    Artifact(ArtifactId),
    /// A page or document that owns artifacts.
    Container(ContainerId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact(id) => write!(f, "artifact {id}"),
            Self::Container(id) => write!(f, "container {id}"),
        }
    }
}

impl From<ArtifactId> for Resource {
    fn from(id: ArtifactId) -> Self {
        Self::Artifact(id)
    }
}

impl From<ContainerId> for Resource {
    fn from(id: ContainerId) -> Self {
        Self::Container(id)
    }
}

/// Host permission model.
#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Returns whether `user` may perform `intent` on `resource`.
    async fn has_permission(&self, user: UserId, intent: Intent, resource: Resource)
    -> Result<bool>;
}

/// Shared handle to a [`PermissionProvider`].
#[derive(Clone)]
pub struct PermissionService {
    inner: Arc<dyn PermissionProvider>,
}

impl fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionService").finish_non_exhaustive()
    }
}

impl PermissionService {
    /// Create a new permission service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: PermissionProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Asks the host whether `user` may perform `intent` on `resource`.
    pub async fn has_permission(
        &self,
        user: UserId,
        intent: Intent,
        resource: Resource,
    ) -> Result<bool> {
        let granted = self.inner.has_permission(user, intent, resource).await?;

        tracing::trace!(
            target: TRACING_TARGET,
            user_id = %user,
            intent = %intent,
            resource = %resource,
            granted,
            "Permission evaluated"
        );

        Ok(granted)
    }
}
