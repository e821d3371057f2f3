//! Build executor: turns entries into artifacts.

mod artifact;
mod cache;
mod executor;

pub use artifact::{Artifact, BuiltArtifact};
pub use cache::ArtifactCache;
pub use executor::{build_all, build_entry};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fingerprint::CollisionError;
use crate::transform::StageError;

/// Failure while building one entry or sealing the run.
///
/// A single entry failure cancels manifest emission for the whole run:
/// the pipeline never emits a manifest referencing an incomplete artifact.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("entry `{entry}`: failed to read source `{}`", .path.display())]
    ReadSource {
        entry: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("entry `{entry}`: stage `{stage}` failed on `{}`", .path.display())]
    Transform {
        entry: String,
        path: PathBuf,
        stage: &'static str,
        #[source]
        source: StageError,
    },

    #[error(transparent)]
    FingerprintCollision(#[from] CollisionError),
}

impl BuildError {
    /// Entry name the failure belongs to, if it is entry-scoped.
    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::ReadSource { entry, .. } | Self::Transform { entry, .. } => Some(entry),
            Self::FingerprintCollision(_) => None,
        }
    }
}
