//! Artifact creation, versions and collaboration bundles.
//!
//! Every write runs in a single storage transaction and network fetches
//! complete before the transaction opens, so a failure at any step leaves
//! storage untouched.

use std::collections::HashSet;

use bytes::Bytes;
use coedit_convert::DownloadService;
use coedit_core::format::normalize_extension;
use coedit_core::storage::StorageService;
use coedit_core::types::{Artifact, ArtifactId, ContainerId, NewArtifact, User};
use coedit_core::{Error, Result, RevisionKey, derive_key};
use url::Url;

use crate::{AccessGate, DocumentConfig};

/// Tracing target for artifact lifecycle operations.
pub const TRACING_TARGET: &str = "coedit_document::lifecycle";

/// Name of the edit history side-artifact.
pub const HISTORY_FILE_NAME: &str = "coedit-changes.json";

/// Media type of the edit history side-artifact.
pub const HISTORY_MEDIA_TYPE: &str = "application/json";

/// Name of the binary diff side-artifact.
pub const DIFF_FILE_NAME: &str = "coedit-diff.zip";

/// Media type of the binary diff side-artifact.
pub const DIFF_MEDIA_TYPE: &str = "application/zip";

/// Characters replaced by `_` in file names.
const RESERVED_NAME_CHARS: &[char] = &['*', '?', ':', '"', '<', '>', '/', '|', '\\'];

/// Manages artifacts in host storage.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    gate: AccessGate,
    storage: StorageService,
    downloads: DownloadService,
    config: DocumentConfig,
}

impl ArtifactManager {
    /// Creates a new artifact manager.
    pub fn new(
        gate: AccessGate,
        storage: StorageService,
        downloads: DownloadService,
        config: DocumentConfig,
    ) -> Self {
        Self {
            gate,
            storage,
            downloads,
            config,
        }
    }

    pub(crate) fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Stores a new artifact and lists it in its container.
    ///
    /// Requires create access on the container. The artifact is attributed to
    /// `creator` regardless of [`NewArtifact::creator_id`].
    #[tracing::instrument(skip_all, fields(container_id = %artifact.container_id))]
    pub async fn create_artifact(
        &self,
        creator: Option<&User>,
        mut artifact: NewArtifact,
    ) -> Result<ArtifactId> {
        let creator = self
            .gate
            .require_create_access(creator, artifact.container_id)
            .await?;
        self.check_size(artifact.file_size(), &artifact.file_name)?;
        artifact.creator_id = creator.id;

        let mut tx = self.storage.begin().await?;
        let saved = tx.save_new_version(artifact, None).await?;
        tx.attach_to_container(&saved).await?;
        tx.commit().await?;

        tracing::info!(
            target: TRACING_TARGET,
            artifact_id = %saved.id,
            container_id = %saved.container_id,
            file_name = %saved.file_name,
            size = saved.file_size,
            "Artifact created"
        );

        Ok(saved.id)
    }

    /// Stores `data` as the next version of an artifact.
    ///
    /// Requires edit access. Name, media type and container carry over from
    /// the previous version.
    #[tracing::instrument(skip_all, fields(artifact_id = %artifact_id))]
    pub async fn save_version(
        &self,
        user: Option<&User>,
        artifact_id: ArtifactId,
        data: Bytes,
    ) -> Result<Artifact> {
        let user = self.gate.require_access(user, artifact_id, true).await?;
        let previous = self.storage.get_artifact(artifact_id).await?;
        self.check_size(data.len() as u64, &previous.file_name)?;

        let artifact = NewArtifact::new(
            previous.file_name.clone(),
            previous.media_type.clone(),
            data,
            previous.container_id,
            user.id,
        );

        let mut tx = self.storage.begin().await?;
        let saved = tx.save_new_version(artifact, Some(&previous)).await?;
        tx.commit().await?;

        tracing::info!(
            target: TRACING_TARGET,
            artifact_id = %saved.id,
            version = saved.version,
            size = saved.file_size,
            "Artifact version saved"
        );

        Ok(saved)
    }

    /// Returns a file name for `base.ext` that no artifact in the container
    /// uses yet.
    ///
    /// Reserved characters (`* ? : " < > / | \`) become `_`; collisions are
    /// resolved by appending ` (1)`, ` (2)`, ... before the extension.
    pub async fn resolve_unique_name(
        &self,
        base: &str,
        ext: &str,
        container_id: ContainerId,
    ) -> Result<String> {
        let taken: HashSet<String> = self
            .storage
            .latest_versions(container_id)
            .await?
            .into_iter()
            .map(|artifact| artifact.file_name)
            .collect();

        let base = sanitize_name(base);
        let ext = sanitize_name(&normalize_extension(ext));
        let join = |stem: &str| {
            if ext.is_empty() {
                stem.to_owned()
            } else {
                format!("{stem}.{ext}")
            }
        };

        let mut name = join(&base);
        let mut counter = 0;
        while taken.contains(&name) {
            counter += 1;
            name = join(&format!("{base} ({counter})"));
        }

        Ok(name)
    }

    /// Stores the edit history and the binary diff of an editing session next
    /// to an artifact.
    ///
    /// Does nothing when either part is empty. The diff is fetched completely
    /// before anything is written; both side-artifacts and the artifact's
    /// modification time are committed together.
    #[tracing::instrument(skip_all, fields(artifact_id = %artifact_id))]
    pub async fn attach_collaboration_bundle(
        &self,
        artifact_id: ArtifactId,
        history: &str,
        diff_url: &str,
    ) -> Result<()> {
        if history.is_empty() || diff_url.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET,
                artifact_id = %artifact_id,
                "Incomplete collaboration bundle, skipping"
            );
            return Ok(());
        }

        let diff_url = Url::parse(diff_url).map_err(|e| {
            Error::invalid_argument()
                .with_message("diff URL is not a valid URL")
                .with_context(format!("artifact {artifact_id}"))
                .with_source(e)
        })?;

        let primary = self.storage.get_artifact(artifact_id).await?;
        let diff = self
            .downloads
            .download(&diff_url, Some(self.config.effective_fetch_timeout()))
            .await?;

        let history = NewArtifact::new(
            HISTORY_FILE_NAME,
            HISTORY_MEDIA_TYPE,
            Bytes::copy_from_slice(history.as_bytes()),
            primary.container_id,
            primary.creator_id,
        );
        let diff = NewArtifact::new(
            DIFF_FILE_NAME,
            DIFF_MEDIA_TYPE,
            diff,
            primary.container_id,
            primary.creator_id,
        );

        let mut tx = self.storage.begin().await?;
        tx.add_side_artifact(&primary, history).await?;
        tx.add_side_artifact(&primary, diff).await?;
        tx.touch_artifact(&primary).await?;
        tx.commit().await?;

        tracing::info!(
            target: TRACING_TARGET,
            artifact_id = %artifact_id,
            "Collaboration bundle attached"
        );

        Ok(())
    }

    /// Removes the collaboration bundle of an artifact.
    ///
    /// Whichever parts exist are removed together; a missing bundle is not an
    /// error.
    #[tracing::instrument(skip_all, fields(artifact_id = %artifact_id))]
    pub async fn remove_collaboration_bundle(&self, artifact_id: ArtifactId) -> Result<()> {
        let history = self.history_artifact(artifact_id).await?;
        let diff = self.diff_artifact(artifact_id).await?;
        let parts: Vec<Artifact> = history.into_iter().chain(diff).collect();

        if parts.is_empty() {
            return Ok(());
        }

        let mut tx = self.storage.begin().await?;
        for part in &parts {
            tx.remove_side_artifact(part).await?;
        }
        tx.commit().await?;

        tracing::info!(
            target: TRACING_TARGET,
            artifact_id = %artifact_id,
            removed = parts.len(),
            "Collaboration bundle removed"
        );

        Ok(())
    }

    /// Returns the fingerprint of the artifact's latest version.
    pub async fn revision_fingerprint(&self, artifact_id: ArtifactId) -> Result<String> {
        Ok(self.storage.get_artifact(artifact_id).await?.fingerprint())
    }

    /// Returns the revision key of the artifact's latest version.
    pub async fn revision_key(&self, artifact_id: ArtifactId) -> Result<RevisionKey> {
        derive_key(&self.revision_fingerprint(artifact_id).await?)
    }

    /// Returns the latest version of an artifact.
    pub async fn artifact(&self, artifact_id: ArtifactId) -> Result<Artifact> {
        self.storage.get_artifact(artifact_id).await
    }

    /// Returns the file name of the artifact's latest version.
    pub async fn file_name(&self, artifact_id: ArtifactId) -> Result<String> {
        Ok(self.artifact(artifact_id).await?.file_name)
    }

    /// Returns the media type of the artifact's latest version.
    pub async fn media_type(&self, artifact_id: ArtifactId) -> Result<String> {
        Ok(self.artifact(artifact_id).await?.media_type)
    }

    /// Returns the lowercase extension of the artifact's file name.
    pub async fn extension(&self, artifact_id: ArtifactId) -> Result<String> {
        Ok(self.artifact(artifact_id).await?.extension())
    }

    /// Returns the version number of the artifact's latest version.
    pub async fn version(&self, artifact_id: ArtifactId) -> Result<u32> {
        Ok(self.artifact(artifact_id).await?.version)
    }

    /// Lists every version of an artifact, oldest first.
    pub async fn all_versions(&self, artifact_id: ArtifactId) -> Result<Vec<Artifact>> {
        self.storage.all_versions(artifact_id).await
    }

    /// Returns the edit history side-artifact, if any.
    pub async fn history_artifact(&self, artifact_id: ArtifactId) -> Result<Option<Artifact>> {
        self.storage
            .find_side_artifact(artifact_id, HISTORY_FILE_NAME)
            .await
    }

    /// Returns the binary diff side-artifact, if any.
    pub async fn diff_artifact(&self, artifact_id: ArtifactId) -> Result<Option<Artifact>> {
        self.storage
            .find_side_artifact(artifact_id, DIFF_FILE_NAME)
            .await
    }

    /// Reads the bytes of an artifact's latest version. Requires view access.
    pub async fn read_data(&self, user: Option<&User>, artifact_id: ArtifactId) -> Result<Bytes> {
        self.gate.require_access(user, artifact_id, false).await?;
        self.storage.read_data(artifact_id).await
    }

    fn check_size(&self, size: u64, file_name: &str) -> Result<()> {
        if size == 0 {
            return Err(Error::invalid_argument()
                .with_message("artifact content must not be empty")
                .with_context(file_name.to_owned()));
        }

        let limit = self.config.effective_max_file_size();
        if size > limit {
            tracing::warn!(
                target: TRACING_TARGET,
                file_name = %file_name,
                size,
                limit,
                "Artifact exceeds the size limit"
            );
            let message = format!("artifact size {size} exceeds the limit of {limit} bytes");
            return Err(Error::invalid_argument()
                .with_message(message)
                .with_context(file_name.to_owned()));
        }

        Ok(())
    }
}

fn sanitize_name(name: &str) -> String {
    name.replace(RESERVED_NAME_CHARS, "_")
}

#[cfg(test)]
mod tests {
    use coedit_core::ErrorKind;
    use coedit_core::permission::Intent;
    use coedit_core::types::UserId;
    use coedit_test::{FailPoint, MockHost};

    use super::*;

    const PAGE: ContainerId = ContainerId::new(100);

    struct Fixture {
        host: MockHost,
        manager: ArtifactManager,
        user: User,
    }

    fn fixture_with(config: DocumentConfig) -> Fixture {
        let host = MockHost::new();
        let manager = ArtifactManager::new(
            AccessGate::new(host.permission_service()),
            host.storage_service(),
            host.download_service(),
            config,
        );
        let user = User::new(UserId::new_v7());
        host.permissions.grant(user.id, Intent::Create, PAGE);

        Fixture {
            host,
            manager,
            user,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(DocumentConfig::default())
    }

    fn diff_url() -> Url {
        Url::parse("https://docs.example.test/cache/diff.zip").unwrap()
    }

    fn new_artifact(f: &Fixture, name: &str, data: &'static [u8]) -> NewArtifact {
        NewArtifact::new(name, "application/octet-stream", data, PAGE, f.user.id)
    }

    #[tokio::test]
    async fn test_create_artifact() {
        let f = fixture();

        let id = f
            .manager
            .create_artifact(Some(&f.user), new_artifact(&f, "a.docx", b"hello"))
            .await
            .unwrap();

        let stored = f.host.storage.artifact(id).unwrap();
        assert_eq!(stored.file_size, 5);
        assert_eq!(stored.version, 1);
        assert_eq!(stored.creator_id, f.user.id);
        assert_eq!(f.host.storage.container_names(PAGE), vec!["a.docx"]);
    }

    #[tokio::test]
    async fn test_create_requires_create_access() {
        let f = fixture();
        let stranger = User::new(UserId::new_v7());

        let error = f
            .manager
            .create_artifact(Some(&stranger), new_artifact(&f, "a.docx", b"x"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);

        let calls = f.host.permissions.calls();
        let error = f
            .manager
            .create_artifact(None, new_artifact(&f, "a.docx", b"x"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);
        assert_eq!(f.host.permissions.calls(), calls);
        assert_eq!(f.host.storage.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_oversized() {
        let f = fixture_with(DocumentConfig::default().with_max_file_size(4));

        let error = f
            .manager
            .create_artifact(Some(&f.user), new_artifact(&f, "a.docx", b""))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        let error = f
            .manager
            .create_artifact(Some(&f.user), new_artifact(&f, "a.docx", b"12345"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(f.host.storage.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_create_rolls_back_on_attach_failure() {
        let f = fixture();
        f.host.storage.fail_on(FailPoint::AttachToContainer);

        let error = f
            .manager
            .create_artifact(Some(&f.user), new_artifact(&f, "a.docx", b"bytes"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Storage);
        assert_eq!(f.host.storage.artifact_count(), 0);
        assert!(f.host.storage.container_names(PAGE).is_empty());
        assert_eq!(f.host.storage.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_unique_name() {
        let f = fixture();
        f.host.storage.insert("a.docx", "1", PAGE, f.user.id);
        f.host.storage.insert("a (1).docx", "2", PAGE, f.user.id);

        let name = f
            .manager
            .resolve_unique_name("a", "docx", PAGE)
            .await
            .unwrap();
        assert_eq!(name, "a (2).docx");

        let name = f
            .manager
            .resolve_unique_name("b", "docx", PAGE)
            .await
            .unwrap();
        assert_eq!(name, "b.docx");

        let name = f
            .manager
            .resolve_unique_name("a", "docx", ContainerId::new(5))
            .await
            .unwrap();
        assert_eq!(name, "a.docx");
    }

    #[tokio::test]
    async fn test_unique_name_sanitizes() {
        let f = fixture();
        f.host
            .storage
            .insert("Q_A_ draft_.xlsx", "1", PAGE, f.user.id);

        let name = f
            .manager
            .resolve_unique_name("Q/A: draft?", "XLSX", PAGE)
            .await
            .unwrap();
        assert_eq!(name, "Q_A_ draft_ (1).xlsx");
    }

    #[tokio::test]
    async fn test_save_version() {
        let f = fixture();
        let artifact = f.host.storage.insert("notes.docx", "v1", PAGE, f.user.id);
        f.host
            .permissions
            .grant(f.user.id, Intent::Edit, artifact.id);

        let key_before = f.manager.revision_key(artifact.id).await.unwrap();
        let saved = f
            .manager
            .save_version(Some(&f.user), artifact.id, Bytes::from_static(b"v2"))
            .await
            .unwrap();
        let key_after = f.manager.revision_key(artifact.id).await.unwrap();

        assert_eq!(saved.version, 2);
        assert_eq!(saved.file_name, "notes.docx");
        assert_ne!(key_before, key_after);
        assert_eq!(f.manager.all_versions(artifact.id).await.unwrap().len(), 2);
        assert_eq!(f.manager.version(artifact.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_version_requires_edit() {
        let f = fixture();
        let artifact = f.host.storage.insert("notes.docx", "v1", PAGE, f.user.id);
        f.host
            .permissions
            .grant(f.user.id, Intent::View, artifact.id);

        let error = f
            .manager
            .save_version(Some(&f.user), artifact.id, Bytes::from_static(b"v2"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::AccessDenied);
        assert_eq!(f.manager.version(artifact.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attach_and_remove_bundle() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);
        f.host.downloads.insert(diff_url(), "PK diff");

        f.manager
            .attach_collaboration_bundle(artifact.id, r#"{"changes":[]}"#, diff_url().as_str())
            .await
            .unwrap();

        let history = f
            .manager
            .history_artifact(artifact.id)
            .await
            .unwrap()
            .unwrap();
        let diff = f.manager.diff_artifact(artifact.id).await.unwrap().unwrap();
        assert_eq!(history.media_type, HISTORY_MEDIA_TYPE);
        assert_eq!(history.parent_id, Some(artifact.id));
        assert_eq!(history.container_id, PAGE);
        assert_eq!(diff.media_type, DIFF_MEDIA_TYPE);
        assert_eq!(f.host.storage.data(diff.id).unwrap().as_ref(), b"PK diff");
        assert_eq!(
            f.host.downloads.timeouts(),
            vec![Some(DocumentConfig::default().effective_fetch_timeout())]
        );

        let touched = f.manager.artifact(artifact.id).await.unwrap();
        assert!(touched.updated_at > artifact.updated_at);
        assert_eq!(touched.version, artifact.version);

        f.manager
            .remove_collaboration_bundle(artifact.id)
            .await
            .unwrap();
        assert!(f.host.storage.side_artifacts(artifact.id).is_empty());

        // Removing a missing bundle is not an error.
        f.manager
            .remove_collaboration_bundle(artifact.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_history_only_bundle() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);
        let owner = f.user.id;
        let history = NewArtifact::new(HISTORY_FILE_NAME, HISTORY_MEDIA_TYPE, "{}", PAGE, owner);

        let mut tx = f.host.storage_service().begin().await.unwrap();
        tx.add_side_artifact(&artifact, history).await.unwrap();
        tx.commit().await.unwrap();
        let diff = f.manager.diff_artifact(artifact.id).await.unwrap();
        assert!(diff.is_none());

        f.manager
            .remove_collaboration_bundle(artifact.id)
            .await
            .unwrap();
        let history = f.manager.history_artifact(artifact.id).await.unwrap();
        assert!(history.is_none());
        assert!(f.host.storage.side_artifacts(artifact.id).is_empty());
    }

    #[tokio::test]
    async fn test_failed_bundle_removal_keeps_both_parts() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);
        f.host.downloads.insert(diff_url(), "PK diff");
        f.manager
            .attach_collaboration_bundle(artifact.id, "{}", diff_url().as_str())
            .await
            .unwrap();

        for point in [FailPoint::RemoveSideArtifact, FailPoint::Commit] {
            f.host.storage.fail_on(point);
            let error = f
                .manager
                .remove_collaboration_bundle(artifact.id)
                .await
                .unwrap_err();

            assert_eq!(error.kind(), ErrorKind::Storage);
            assert_eq!(f.host.storage.side_artifacts(artifact.id).len(), 2);
        }
    }

    #[tokio::test]
    async fn test_incomplete_bundle_is_ignored() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);

        f.manager
            .attach_collaboration_bundle(artifact.id, "", diff_url().as_str())
            .await
            .unwrap();
        f.manager
            .attach_collaboration_bundle(artifact.id, "{}", "")
            .await
            .unwrap();

        assert_eq!(f.host.downloads.calls(), 0);
        assert!(f.host.storage.side_artifacts(artifact.id).is_empty());
    }

    #[tokio::test]
    async fn test_failed_diff_fetch_writes_nothing() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);
        f.host.downloads.respond_with_status(diff_url(), 500);

        let error = f
            .manager
            .attach_collaboration_bundle(artifact.id, "{}", diff_url().as_str())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ConversionTransport);
        assert!(f.host.storage.side_artifacts(artifact.id).is_empty());
        assert_eq!(f.host.storage.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_bundle_is_all_or_nothing() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);
        f.host.downloads.insert(diff_url(), "PK diff");
        f.host.storage.fail_on(FailPoint::TouchArtifact);

        let error = f
            .manager
            .attach_collaboration_bundle(artifact.id, "{}", diff_url().as_str())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Storage);
        assert!(f.host.storage.side_artifacts(artifact.id).is_empty());
        assert_eq!(
            f.host.storage.artifact(artifact.id).unwrap().updated_at,
            artifact.updated_at
        );
    }

    #[tokio::test]
    async fn test_read_data_requires_view() {
        let f = fixture();
        let artifact = f.host.storage.insert("plan.pptx", "deck", PAGE, f.user.id);

        let error = f
            .manager
            .read_data(Some(&f.user), artifact.id)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);

        f.host
            .permissions
            .grant(f.user.id, Intent::View, artifact.id);
        let data = f
            .manager
            .read_data(Some(&f.user), artifact.id)
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"deck");
    }

    #[tokio::test]
    async fn test_accessors() {
        let f = fixture();
        let artifact = f
            .host
            .storage
            .insert("Budget.XLSX", "cells", PAGE, f.user.id);

        assert_eq!(
            f.manager.file_name(artifact.id).await.unwrap(),
            "Budget.XLSX"
        );
        assert_eq!(f.manager.extension(artifact.id).await.unwrap(), "xlsx");
        assert_eq!(
            f.manager.media_type(artifact.id).await.unwrap(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            f.manager.revision_fingerprint(artifact.id).await.unwrap(),
            artifact.fingerprint()
        );

        let error = f.manager.artifact(ArtifactId::new(999)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
