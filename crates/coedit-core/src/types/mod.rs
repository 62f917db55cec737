//! Data model shared by the access gate, the orchestrator and the lifecycle
//! manager.

mod artifact;
mod user;

pub use artifact::{Artifact, ArtifactId, ContainerId, NewArtifact};
pub use user::{User, UserId};
