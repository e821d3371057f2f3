//! Manifest: logical asset name → fingerprinted public path.
//!
//! The manifest is the only pipeline output a server-side renderer reads;
//! it maps `app.js` to `<public-base>/app.3b1f0a9c.js` so templates can
//! emit correct `<script>`/`<link>` URLs. It is serialized once per run
//! and replaces any prior manifest atomically: a reader never observes a
//! partially-written or missing manifest during a deploy window.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::build::BuiltArtifact;
use crate::config::BuildProfile;

/// Default manifest filename inside the output root.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to write manifest to `{}`", .0.display())]
    Io(std::path::PathBuf, #[source] io::Error),

    #[error("failed to serialize manifest")]
    Serialize(#[from] serde_json::Error),
}

/// The full set of manifest entries for one build, in entry declaration
/// order (deterministic for reproducible manifests).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
}

impl Manifest {
    /// An empty manifest is valid: a deploy with no entries yet built
    /// still produces a readable `{}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the manifest for one run's sealed artifacts.
    ///
    /// Logical keys and public paths have configured ignore prefixes
    /// stripped, matching how the public base URL is structured (fonts
    /// and style sources live under prefixes the HTTP layer never
    /// exposes).
    pub fn from_artifacts(artifacts: &[BuiltArtifact], profile: &BuildProfile) -> Self {
        let entries = artifacts
            .iter()
            .map(|built| {
                let logical = strip_ignored(&built.logical_name(), &profile.ignore_paths);
                let output = strip_ignored(&built.output_name(), &profile.ignore_paths);
                (logical, profile.public_url(&output))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == logical)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as a single ordered JSON object.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.entries {
            map.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
        Ok(serde_json::to_string_pretty(&serde_json::Value::Object(
            map,
        ))?)
    }

    /// Persist atomically: write to a temp path, then rename over the
    /// target. An I/O or serialization failure leaves any prior manifest
    /// intact.
    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| ManifestError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, path).map_err(|e| ManifestError::Io(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Strip configured ignore prefixes from a slash-separated path.
///
/// Each ignore entry names a path segment sequence (e.g. `/fonts`); any
/// occurrence of those segments is removed: with ignore list `["/fonts"]`,
/// `static/fonts/a.woff` records as `static/a.woff`.
pub fn strip_ignored(path: &str, ignore_paths: &[String]) -> String {
    let ignored: Vec<Vec<&str>> = ignore_paths
        .iter()
        .map(|p| p.split('/').filter(|s| !s.is_empty()).collect())
        .collect();

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut kept: Vec<&str> = Vec::with_capacity(segments.len());

    let mut i = 0;
    'outer: while i < segments.len() {
        for prefix in &ignored {
            if !prefix.is_empty() && segments[i..].starts_with(prefix) {
                i += prefix.len();
                continue 'outer;
            }
        }
        kept.push(segments[i]);
        i += 1;
    }

    let joined = kept.join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}
