//! In-memory transactional storage.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use coedit_core::storage::{StorageProvider, StorageService, StorageTransaction};
use coedit_core::types::{Artifact, ArtifactId, ContainerId, NewArtifact, UserId};
use coedit_core::{Error, Result};
use jiff::{SignedDuration, Timestamp};

/// Storage operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Storing a new artifact or version.
    SaveNewVersion,
    /// Listing an artifact in its container.
    AttachToContainer,
    /// Storing a side-artifact.
    AddSideArtifact,
    /// Deleting a side-artifact.
    RemoveSideArtifact,
    /// Bumping an artifact's modification time.
    TouchArtifact,
    /// Publishing a transaction.
    Commit,
}

#[derive(Debug, Clone)]
struct StoredVersion {
    artifact: Artifact,
    data: Bytes,
}

#[derive(Debug, Clone, Default)]
struct StorageState {
    next_id: u64,
    versions: BTreeMap<ArtifactId, Vec<StoredVersion>>,
    containers: BTreeMap<ContainerId, Vec<ArtifactId>>,
    side_artifacts: BTreeMap<(ArtifactId, String), ArtifactId>,
}

impl StorageState {
    fn allocate_id(&mut self) -> ArtifactId {
        self.next_id += 1;
        ArtifactId::new(self.next_id)
    }

    fn latest(&self, id: ArtifactId) -> Option<&StoredVersion> {
        self.versions.get(&id).and_then(|versions| versions.last())
    }

    fn insert_version(
        &mut self,
        id: ArtifactId,
        new: NewArtifact,
        parent_id: Option<ArtifactId>,
    ) -> Artifact {
        let now = Timestamp::now();
        let (version, created_at) = match self.latest(id) {
            Some(previous) => (previous.artifact.version + 1, previous.artifact.created_at),
            None => (1, now),
        };

        let artifact = Artifact {
            id,
            file_size: new.file_size(),
            file_name: new.file_name,
            media_type: new.media_type,
            version,
            container_id: new.container_id,
            parent_id,
            creator_id: new.creator_id,
            created_at,
            updated_at: now,
        };

        self.versions.entry(id).or_default().push(StoredVersion {
            artifact: artifact.clone(),
            data: new.data,
        });

        artifact
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: StorageState,
    fail_on: Option<FailPoint>,
    commits: usize,
}

/// In-memory storage sharing its state between clones.
///
/// A transaction works on a snapshot and replaces the shared state on commit;
/// dropping it discards the snapshot.
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    shared: Arc<Mutex<Shared>>,
}

impl MockStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a handle to this storage into a [`StorageService`].
    pub fn service(&self) -> StorageService {
        StorageService::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores an artifact listed in `container_id`, bypassing transactions.
    pub fn insert(
        &self,
        file_name: &str,
        data: impl Into<Bytes>,
        container_id: ContainerId,
        creator_id: UserId,
    ) -> Artifact {
        let media_type = coedit_core::format::mime_type(file_name);
        let new = NewArtifact::new(file_name, media_type, data, container_id, creator_id);

        let mut shared = self.lock();
        let id = shared.state.allocate_id();
        let artifact = shared.state.insert_version(id, new, None);
        shared
            .state
            .containers
            .entry(container_id)
            .or_default()
            .push(id);

        artifact
    }

    /// Makes every later call of `point` fail with a storage error.
    pub fn fail_on(&self, point: FailPoint) {
        self.lock().fail_on = Some(point);
    }

    /// Removes the injected failure.
    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    /// Returns the latest version of an artifact.
    pub fn artifact(&self, id: ArtifactId) -> Option<Artifact> {
        self.lock().state.latest(id).map(|v| v.artifact.clone())
    }

    /// Returns the bytes of the latest version of an artifact.
    pub fn data(&self, id: ArtifactId) -> Option<Bytes> {
        self.lock().state.latest(id).map(|v| v.data.clone())
    }

    /// Returns the number of stored artifacts, side-artifacts included.
    pub fn artifact_count(&self) -> usize {
        self.lock().state.versions.len()
    }

    /// Returns the side-artifacts of `parent_id`.
    pub fn side_artifacts(&self, parent_id: ArtifactId) -> Vec<Artifact> {
        let shared = self.lock();
        shared
            .state
            .side_artifacts
            .iter()
            .filter(|((parent, _), _)| *parent == parent_id)
            .filter_map(|(_, id)| shared.state.latest(*id))
            .map(|v| v.artifact.clone())
            .collect()
    }

    /// Returns the names of the artifacts listed in a container.
    pub fn container_names(&self, container_id: ContainerId) -> Vec<String> {
        let shared = self.lock();
        shared
            .state
            .containers
            .get(&container_id)
            .into_iter()
            .flatten()
            .filter_map(|id| shared.state.latest(*id))
            .map(|v| v.artifact.file_name.clone())
            .collect()
    }

    /// Returns how many transactions were committed.
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }
}

fn check(shared: &Arc<Mutex<Shared>>, point: FailPoint) -> Result<()> {
    let fail_on = shared.lock().unwrap_or_else(|e| e.into_inner()).fail_on;
    if fail_on == Some(point) {
        return Err(Error::storage()
            .with_message("injected failure")
            .with_context(format!("{point:?}")));
    }
    Ok(())
}

fn missing(id: ArtifactId) -> Error {
    Error::not_found()
        .with_message("artifact does not exist")
        .with_context(format!("artifact {id}"))
}

#[async_trait::async_trait]
impl StorageProvider for MockStorage {
    async fn find_artifact(&self, id: ArtifactId) -> Result<Option<Artifact>> {
        Ok(self.artifact(id))
    }

    async fn latest_versions(&self, container_id: ContainerId) -> Result<Vec<Artifact>> {
        let shared = self.lock();
        Ok(shared
            .state
            .containers
            .get(&container_id)
            .into_iter()
            .flatten()
            .filter_map(|id| shared.state.latest(*id))
            .map(|v| v.artifact.clone())
            .collect())
    }

    async fn all_versions(&self, id: ArtifactId) -> Result<Vec<Artifact>> {
        let shared = self.lock();
        Ok(shared
            .state
            .versions
            .get(&id)
            .into_iter()
            .flatten()
            .map(|v| v.artifact.clone())
            .collect())
    }

    async fn find_side_artifact(
        &self,
        parent_id: ArtifactId,
        file_name: &str,
    ) -> Result<Option<Artifact>> {
        let shared = self.lock();
        Ok(shared
            .state
            .side_artifacts
            .get(&(parent_id, file_name.to_owned()))
            .and_then(|id| shared.state.latest(*id))
            .map(|v| v.artifact.clone()))
    }

    async fn read_data(&self, id: ArtifactId) -> Result<Bytes> {
        self.data(id).ok_or_else(|| missing(id))
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>> {
        let staged = self.lock().state.clone();
        Ok(Box::new(MockTransaction {
            shared: self.shared.clone(),
            staged,
        }))
    }
}

/// Snapshot of the storage state with pending writes.
struct MockTransaction {
    shared: Arc<Mutex<Shared>>,
    staged: StorageState,
}

#[async_trait::async_trait]
impl StorageTransaction for MockTransaction {
    async fn save_new_version(
        &mut self,
        artifact: NewArtifact,
        previous: Option<&Artifact>,
    ) -> Result<Artifact> {
        check(&self.shared, FailPoint::SaveNewVersion)?;

        let (id, parent_id) = match previous {
            Some(previous) => match self.staged.latest(previous.id) {
                Some(stored) => (previous.id, stored.artifact.parent_id),
                None => return Err(missing(previous.id)),
            },
            None => (self.staged.allocate_id(), None),
        };

        Ok(self.staged.insert_version(id, artifact, parent_id))
    }

    async fn attach_to_container(&mut self, artifact: &Artifact) -> Result<()> {
        check(&self.shared, FailPoint::AttachToContainer)?;

        if self.staged.latest(artifact.id).is_none() {
            return Err(missing(artifact.id));
        }

        let listed = self
            .staged
            .containers
            .entry(artifact.container_id)
            .or_default();
        if !listed.contains(&artifact.id) {
            listed.push(artifact.id);
        }
        Ok(())
    }

    async fn add_side_artifact(
        &mut self,
        parent: &Artifact,
        child: NewArtifact,
    ) -> Result<Artifact> {
        check(&self.shared, FailPoint::AddSideArtifact)?;

        if self.staged.latest(parent.id).is_none() {
            return Err(missing(parent.id));
        }

        let key = (parent.id, child.file_name.clone());
        let id = match self.staged.side_artifacts.get(&key) {
            Some(id) => *id,
            None => self.staged.allocate_id(),
        };

        let artifact = self.staged.insert_version(id, child, Some(parent.id));
        self.staged.side_artifacts.insert(key, id);
        Ok(artifact)
    }

    async fn remove_side_artifact(&mut self, child: &Artifact) -> Result<()> {
        check(&self.shared, FailPoint::RemoveSideArtifact)?;

        let parent_id = child.parent_id.ok_or_else(|| {
            Error::invalid_argument()
                .with_message("not a side-artifact")
                .with_context(format!("artifact {}", child.id))
        })?;

        self.staged
            .side_artifacts
            .remove(&(parent_id, child.file_name.clone()));
        self.staged
            .versions
            .remove(&child.id)
            .map(|_| ())
            .ok_or_else(|| missing(child.id))
    }

    async fn touch_artifact(&mut self, artifact: &Artifact) -> Result<Artifact> {
        check(&self.shared, FailPoint::TouchArtifact)?;

        let stored = self
            .staged
            .versions
            .get_mut(&artifact.id)
            .and_then(|versions| versions.last_mut())
            .ok_or_else(|| missing(artifact.id))?;

        // Keep the modification time strictly increasing so fingerprints change.
        let earliest = stored.artifact.updated_at + SignedDuration::from_millis(1);
        stored.artifact.updated_at = Timestamp::now().max(earliest);
        Ok(stored.artifact.clone())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        check(&self.shared, FailPoint::Commit)?;

        let MockTransaction { shared, staged } = *self;
        let mut shared = shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.state = staged;
        shared.commits += 1;
        Ok(())
    }
}
