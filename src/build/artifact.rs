//! Built artifacts and their fingerprinted identities.

use crate::entry::AssetKind;

/// The built output (bytes) for one entry/kind pair, before fingerprinting.
///
/// Produced per run and discarded after the manifest is written; only its
/// identity survives in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Logical name derived from the owning entry.
    pub name: String,
    pub kind: AssetKind,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Logical asset filename, e.g. `app.js`.
    pub fn logical_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.output_ext())
    }

    /// Fingerprinted public filename, e.g. `app.3b1f0a9c.js`.
    pub fn output_name(&self, fingerprint: &str) -> String {
        format!("{}.{}.{}", self.name, fingerprint, self.kind.output_ext())
    }
}

/// An artifact sealed with its content fingerprint.
///
/// This is what the resident development executor keeps in memory and
/// serves over HTTP.
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    pub artifact: Artifact,
    pub fingerprint: String,
}

impl BuiltArtifact {
    pub fn logical_name(&self) -> String {
        self.artifact.logical_name()
    }

    pub fn output_name(&self) -> String {
        self.artifact.output_name(&self.fingerprint)
    }
}
