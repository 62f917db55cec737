//! Contract of the host attachment storage.
//!
//! Reads go straight to the [`StorageProvider`]. Every write goes through a
//! [`StorageTransaction`] obtained from [`StorageProvider::begin`]: changes
//! become visible on [`StorageTransaction::commit`] and are discarded when the
//! transaction is dropped without committing.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::types::{Artifact, ArtifactId, ContainerId, NewArtifact};
use crate::{Error, Result, ServiceHealth};

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "coedit_core::storage";

/// Host attachment storage.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Finds the latest version of an artifact.
    async fn find_artifact(&self, id: ArtifactId) -> Result<Option<Artifact>>;

    /// Lists the latest version of every artifact in a container.
    async fn latest_versions(&self, container_id: ContainerId) -> Result<Vec<Artifact>>;

    /// Lists every stored version of an artifact, oldest first.
    async fn all_versions(&self, id: ArtifactId) -> Result<Vec<Artifact>>;

    /// Finds a side-artifact of `parent_id` by its file name.
    async fn find_side_artifact(
        &self,
        parent_id: ArtifactId,
        file_name: &str,
    ) -> Result<Option<Artifact>>;

    /// Reads the bytes of the latest version of an artifact.
    async fn read_data(&self, id: ArtifactId) -> Result<Bytes>;

    /// Opens a write transaction.
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>>;

    /// Performs a health check on the storage backend.
    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

/// A unit of writes that becomes visible atomically.
#[async_trait::async_trait]
pub trait StorageTransaction: Send {
    /// Persists `artifact` as a brand-new artifact (`previous` is `None`) or
    /// as the next version of `previous`.
    async fn save_new_version(
        &mut self,
        artifact: NewArtifact,
        previous: Option<&Artifact>,
    ) -> Result<Artifact>;

    /// Lists a saved artifact in its container.
    async fn attach_to_container(&mut self, artifact: &Artifact) -> Result<()>;

    /// Persists `child` as a side-artifact of `parent`.
    async fn add_side_artifact(&mut self, parent: &Artifact, child: NewArtifact)
    -> Result<Artifact>;

    /// Removes a side-artifact and its data.
    async fn remove_side_artifact(&mut self, child: &Artifact) -> Result<()>;

    /// Updates the modification metadata of an artifact without a new version.
    async fn touch_artifact(&mut self, artifact: &Artifact) -> Result<Artifact>;

    /// Makes every write of this transaction visible.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Shared handle to a [`StorageProvider`].
#[derive(Clone)]
pub struct StorageService {
    inner: Arc<dyn StorageProvider>,
}

impl fmt::Debug for StorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

impl StorageService {
    /// Create a new storage service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: StorageProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Finds the latest version of an artifact.
    pub async fn find_artifact(&self, id: ArtifactId) -> Result<Option<Artifact>> {
        self.inner.find_artifact(id).await
    }

    /// Returns the latest version of an artifact or a `NotFound` error.
    pub async fn get_artifact(&self, id: ArtifactId) -> Result<Artifact> {
        self.inner.find_artifact(id).await?.ok_or_else(|| {
            Error::not_found()
                .with_message("artifact does not exist")
                .with_context(format!("artifact {id}"))
        })
    }

    /// Lists the latest version of every artifact in a container.
    pub async fn latest_versions(&self, container_id: ContainerId) -> Result<Vec<Artifact>> {
        self.inner.latest_versions(container_id).await
    }

    /// Lists every stored version of an artifact, oldest first.
    pub async fn all_versions(&self, id: ArtifactId) -> Result<Vec<Artifact>> {
        self.inner.all_versions(id).await
    }

    /// Finds a side-artifact of `parent_id` by its file name.
    pub async fn find_side_artifact(
        &self,
        parent_id: ArtifactId,
        file_name: &str,
    ) -> Result<Option<Artifact>> {
        self.inner.find_side_artifact(parent_id, file_name).await
    }

    /// Reads the bytes of the latest version of an artifact.
    pub async fn read_data(&self, id: ArtifactId) -> Result<Bytes> {
        self.inner.read_data(id).await
    }

    /// Opens a write transaction.
    pub async fn begin(&self) -> Result<Box<dyn StorageTransaction>> {
        tracing::trace!(target: TRACING_TARGET, "Opening storage transaction");
        self.inner.begin().await
    }

    /// Performs a health check on the storage backend.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.inner.health_check().await
    }
}
