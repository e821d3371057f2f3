//! Resident artifact cache for the development executor.
//!
//! Serve mode never writes artifacts to disk; it holds the last good
//! artifact set in memory and serves it directly. Writers hold the lock
//! exclusively for the duration of one entry's update, so a reader always
//! observes a complete artifact, never a half-replaced one. A failed
//! rebuild leaves the previous artifact in place.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::BuiltArtifact;

#[derive(Default)]
pub struct ArtifactCache {
    /// Entry name → last good built artifact.
    artifacts: RwLock<FxHashMap<String, Arc<BuiltArtifact>>>,
    /// Entry name → last rebuild error (errors-only status channel for
    /// the dev listener). An entry's error clears only when that entry
    /// rebuilds successfully, so a broken entry stays reported across
    /// rebuild rounds that never touch it.
    errors: RwLock<FxHashMap<String, String>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the artifact for one entry.
    pub fn insert(&self, built: BuiltArtifact) {
        self.artifacts
            .write()
            .insert(built.artifact.name.clone(), Arc::new(built));
    }

    /// Look up by entry name.
    pub fn get(&self, name: &str) -> Option<Arc<BuiltArtifact>> {
        self.artifacts.read().get(name).cloned()
    }

    /// Resolve a requested filename to a cached artifact.
    ///
    /// Accepts both the fingerprinted output name (`app.3b1f0a9c.js`, what
    /// the manifest hands to templates) and the logical name (`app.js`).
    pub fn resolve(&self, filename: &str) -> Option<Arc<BuiltArtifact>> {
        let artifacts = self.artifacts.read();
        artifacts
            .values()
            .find(|a| a.output_name() == filename || a.logical_name() == filename)
            .cloned()
    }

    /// All cached artifacts, unordered.
    pub fn all(&self) -> Vec<Arc<BuiltArtifact>> {
        self.artifacts.read().values().cloned().collect()
    }

    /// Record a rebuild failure for one entry, replacing its prior error.
    pub fn record_error(&self, entry: &str, message: String) {
        self.errors.write().insert(entry.to_string(), message);
    }

    /// Clear one entry's error (called when that entry rebuilds cleanly).
    pub fn clear_error(&self, entry: &str) {
        self.errors.write().remove(entry);
    }

    /// Snapshot of current build errors, sorted by entry name so the
    /// status payload is stable between polls.
    pub fn errors(&self) -> Vec<String> {
        let errors = self.errors.read();
        let mut sorted: Vec<_> = errors.values().cloned().collect();
        sorted.sort();
        sorted
    }
}
