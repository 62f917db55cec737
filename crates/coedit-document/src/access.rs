//! Capability checks in front of every byte-level read and write.

use coedit_core::permission::{Intent, PermissionService, Resource};
use coedit_core::types::{ArtifactId, ContainerId, User};
use coedit_core::{Error, Result};

/// Tracing target for access checks.
pub const TRACING_TARGET: &str = "coedit_document::access";

/// Answers whether a principal may view, edit or create.
///
/// Anonymous principals are denied without consulting the host. Decisions
/// are requested on every call.
#[derive(Debug, Clone)]
pub struct AccessGate {
    permissions: PermissionService,
}

impl AccessGate {
    /// Creates a gate over the host permission model.
    pub fn new(permissions: PermissionService) -> Self {
        Self { permissions }
    }

    /// Returns whether `user` may edit (`for_edit`) or view an artifact.
    pub async fn check_access(
        &self,
        user: Option<&User>,
        artifact_id: ArtifactId,
        for_edit: bool,
    ) -> Result<bool> {
        let intent = Intent::for_artifact(for_edit);
        let target = Resource::Artifact(artifact_id);
        self.check(user, intent, target).await
    }

    /// Returns whether `user` may add artifacts to a container.
    pub async fn check_access_for_create(
        &self,
        user: Option<&User>,
        container_id: ContainerId,
    ) -> Result<bool> {
        let target = Resource::Container(container_id);
        self.check(user, Intent::Create, target).await
    }

    /// Fails with `AccessDenied` unless [`check_access`](Self::check_access)
    /// grants access, and returns the authenticated principal.
    pub async fn require_access<'a>(
        &self,
        user: Option<&'a User>,
        artifact_id: ArtifactId,
        for_edit: bool,
    ) -> Result<&'a User> {
        let intent = Intent::for_artifact(for_edit);
        let target = Resource::Artifact(artifact_id);
        self.require(user, intent, target).await
    }

    /// Fails with `AccessDenied` unless
    /// [`check_access_for_create`](Self::check_access_for_create) grants
    /// access, and returns the authenticated principal.
    pub async fn require_create_access<'a>(
        &self,
        user: Option<&'a User>,
        container_id: ContainerId,
    ) -> Result<&'a User> {
        let target = Resource::Container(container_id);
        self.require(user, Intent::Create, target).await
    }

    async fn check(&self, user: Option<&User>, intent: Intent, target: Resource) -> Result<bool> {
        let Some(user) = user else {
            return Ok(false);
        };

        self.permissions
            .has_permission(user.id, intent, target)
            .await
    }

    async fn require<'a>(
        &self,
        user: Option<&'a User>,
        intent: Intent,
        target: Resource,
    ) -> Result<&'a User> {
        if let Some(user) = user
            && self.check(Some(user), intent, target).await?
        {
            return Ok(user);
        }

        tracing::warn!(
            target: TRACING_TARGET,
            user_id = user.map(|u| u.id.to_string()),
            intent = %intent,
            resource = %target,
            "Access denied"
        );

        Err(Error::access_denied()
            .with_message(format!("{intent} access denied"))
            .with_context(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use coedit_core::ErrorKind;
    use coedit_core::types::UserId;
    use coedit_test::MockPermissions;

    use super::*;

    fn gate() -> (AccessGate, MockPermissions) {
        let permissions = MockPermissions::new();
        (AccessGate::new(permissions.service()), permissions)
    }

    #[tokio::test]
    async fn test_anonymous_is_denied_without_asking() {
        let (gate, permissions) = gate();
        let id = ArtifactId::new(1);
        let page = ContainerId::new(1);

        assert!(!gate.check_access(None, id, false).await.unwrap());
        assert!(!gate.check_access(None, id, true).await.unwrap());
        assert!(!gate.check_access_for_create(None, page).await.unwrap());

        let error = gate.require_access(None, id, false).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);
        assert_eq!(permissions.calls(), 0);
    }

    #[tokio::test]
    async fn test_view_and_edit_are_distinct() {
        let (gate, permissions) = gate();
        let user = User::new(UserId::new_v7());
        let id = ArtifactId::new(8);
        permissions.grant(user.id, Intent::View, id);

        assert!(gate.check_access(Some(&user), id, false).await.unwrap());
        assert!(!gate.check_access(Some(&user), id, true).await.unwrap());
        assert_eq!(permissions.calls(), 2);
    }

    #[tokio::test]
    async fn test_decisions_are_not_cached() {
        let (gate, permissions) = gate();
        let user = User::new(UserId::new_v7());
        let id = ArtifactId::new(3);

        permissions.grant(user.id, Intent::Edit, id);
        assert!(gate.check_access(Some(&user), id, true).await.unwrap());

        permissions.revoke(user.id, Intent::Edit, id);
        assert!(!gate.check_access(Some(&user), id, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_require_returns_principal() {
        let (gate, permissions) = gate();
        let user = User::new(UserId::new_v7());
        let container = ContainerId::new(12);
        permissions.grant(user.id, Intent::Create, container);

        let granted = gate
            .require_create_access(Some(&user), container)
            .await
            .unwrap();
        assert_eq!(granted.id, user.id);

        let error = gate
            .require_create_access(Some(&user), ContainerId::new(13))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_permission_errors_propagate() {
        let (gate, permissions) = gate();
        let user = User::new(UserId::new_v7());
        permissions.set_unavailable(true);

        let error = gate
            .check_access(Some(&user), ArtifactId::new(1), false)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Internal);
    }
}
