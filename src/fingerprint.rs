//! Content fingerprints for cache-busting filenames.
//!
//! A fingerprint is a pure function of artifact bytes (blake3, truncated
//! to 8 hex chars, matching the usual `[chunkhash:8]` convention). Same
//! bytes across rebuilds yield the same public filename, which is what
//! makes long-lived cache-control headers safe at the HTTP layer.
//!
//! Truncation makes collisions theoretically possible, so every run keeps
//! a [`CollisionGuard`]: two artifacts mapping to one fingerprint with
//! different full hashes is a fatal build error, never a silent overwrite.

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Hex characters in a fingerprint.
pub const FINGERPRINT_LEN: usize = 8;

/// Compute the content fingerprint of artifact bytes.
#[inline]
pub fn fingerprint(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hex::encode(&hash.as_bytes()[..FINGERPRINT_LEN / 2])
}

/// Two distinct artifact payloads truncated to the same fingerprint.
#[derive(Debug, Error)]
#[error(
    "fingerprint collision on `{fingerprint}`: artifacts `{existing}` and `{incoming}` have different content"
)]
pub struct CollisionError {
    pub fingerprint: String,
    pub existing: String,
    pub incoming: String,
}

/// Per-run collision detection.
///
/// Tracks fingerprint → (full hash, artifact name) for one build run.
#[derive(Debug, Default)]
pub struct CollisionGuard {
    seen: FxHashMap<String, (blake3::Hash, String)>,
}

impl CollisionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint `bytes` for the named artifact, failing on collision.
    ///
    /// Byte-identical artifacts may legitimately share a fingerprint;
    /// only differing content behind one fingerprint is fatal.
    pub fn fingerprint(&mut self, name: &str, bytes: &[u8]) -> Result<String, CollisionError> {
        let full = blake3::hash(bytes);
        let short = hex::encode(&full.as_bytes()[..FINGERPRINT_LEN / 2]);

        match self.seen.get(&short) {
            Some((existing_hash, existing_name)) if *existing_hash != full => {
                Err(CollisionError {
                    fingerprint: short,
                    existing: existing_name.clone(),
                    incoming: name.to_string(),
                })
            }
            Some(_) => Ok(short),
            None => {
                self.seen.insert(short.clone(), (full, name.to_string()));
                Ok(short)
            }
        }
    }
}
