//! Versioned artifacts tracked by the host storage.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use twox_hash::xxh3::hash64;

use super::UserId;
use crate::format::extension_of;

/// Opaque artifact identifier assigned by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(u64);

impl ArtifactId {
    /// Wraps a raw storage identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw storage identifier.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for ArtifactId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of the page or document that owns artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Wraps a raw container identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw container identifier.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContainerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A stored version of a binary file.
///
/// Artifacts are never mutated in place: a content change is persisted as a
/// new version with a higher version number, which also changes the
/// [`fingerprint`](Self::fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Storage identifier.
    pub id: ArtifactId,
    /// Display name including the extension.
    pub file_name: String,
    /// Media type recorded at upload time.
    pub media_type: String,
    /// Size of the stored bytes.
    pub file_size: u64,
    /// Version number, starting at 1.
    pub version: u32,
    /// Owning page or document.
    pub container_id: ContainerId,
    /// Primary artifact for side-artifacts such as collaboration history.
    pub parent_id: Option<ArtifactId>,
    /// Account that created this version.
    pub creator_id: UserId,
    /// Timestamp when the artifact was first created.
    pub created_at: Timestamp,
    /// Timestamp of the last modification.
    pub updated_at: Timestamp,
}

impl Artifact {
    /// Returns the lowercase file extension without the dot.
    pub fn extension(&self) -> String {
        extension_of(&self.file_name)
    }

    /// Returns true if this artifact hangs off another artifact.
    pub fn is_side_artifact(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Stable structural hash of the storage identity.
    ///
    /// Covers id, version, name, size and modification time; the stored bytes
    /// are intentionally not read.
    pub fn content_hash(&self) -> u32 {
        let identity = format!(
            "{}:{}:{}:{}:{}",
            self.id,
            self.version,
            self.file_name,
            self.file_size,
            self.updated_at.as_millisecond()
        );

        // Truncation keeps fingerprints of small ids within the short-key path.
        hash64(identity.as_bytes()) as u32
    }

    /// Returns `"{id}_{version}_{content_hash}"`.
    pub fn fingerprint(&self) -> String {
        format!("{}_{}_{}", self.id, self.version, self.content_hash())
    }
}

/// Data for creating a new artifact or a new version of one.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    /// Display name including the extension.
    pub file_name: String,
    /// Media type of the bytes.
    pub media_type: String,
    /// Content to persist.
    pub data: Bytes,
    /// Owning page or document.
    pub container_id: ContainerId,
    /// Account creating the artifact.
    pub creator_id: UserId,
}

impl NewArtifact {
    /// Creates a new artifact description.
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Bytes>,
        container_id: ContainerId,
        creator_id: UserId,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data: data.into(),
            container_id,
            creator_id,
        }
    }

    /// Returns the size of the content in bytes.
    pub fn file_size(&self) -> u64 {
        self.data.len() as u64
    }
}
