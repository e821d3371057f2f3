//! Transform registry: extension-keyed chains of processing stages.
//!
//! A stage is an opaque pure function over artifact bytes plus a read-only
//! context. Chains are registered once at configuration time and are
//! immutable during a build run.
//!
//! # Precedence
//!
//! When several registered patterns match the same path, the **first
//! registered** descriptor wins. This is a deliberate, documented rule:
//! the registry never silently applies a later registration over an
//! earlier one.

mod minify;

pub use minify::{MinifyCss, MinifyJs};

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::config::ConfigError;
use crate::entry::AssetKind;

// ============================================================================
// Stage trait
// ============================================================================

/// Read-only context handed to every stage invocation.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Source file the bytes originate from.
    pub source: &'a Path,
    /// Entry the source belongs to.
    pub entry: &'a str,
    pub kind: AssetKind,
}

/// Error produced by a failing transform stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("stage input is not valid UTF-8")]
    NonUtf8Input(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Failed(String),
}

/// One step in a per-extension processing chain.
///
/// Implementations must be pure over `(input, ctx)`: same bytes in, same
/// bytes out, so fingerprints stay stable across rebuilds.
pub trait Transform: Send + Sync {
    /// Stable stage identity used in error reports and exclusion lists.
    fn name(&self) -> &'static str;

    fn apply(&self, input: &[u8], ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError>;
}

/// Stage that returns its input unchanged.
pub struct Passthrough;

impl Transform for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn apply(&self, input: &[u8], _ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
        Ok(input.to_vec())
    }
}

/// Look up a builtin stage by its config name.
pub fn builtin(name: &str) -> Option<Arc<dyn Transform>> {
    match name {
        "passthrough" => Some(Arc::new(Passthrough)),
        "minify-js" => Some(Arc::new(MinifyJs)),
        "minify-css" => Some(Arc::new(MinifyCss)),
        _ => None,
    }
}

// ============================================================================
// Exclusions
// ============================================================================

/// Removes stages for paths matching a pattern, without removing the
/// pass-through behavior: an excluded vendor script still concatenates
/// into its bundle, it just skips the excluded stages.
#[derive(Debug, Clone)]
pub struct Exclusion {
    pattern: Regex,
    /// Stage names to skip; `None` skips every stage of the descriptor.
    stages: Option<Vec<String>>,
}

impl Exclusion {
    /// Exclusion that skips all stages for matching paths.
    pub fn all(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: compile_pattern(pattern)?,
            stages: None,
        })
    }

    /// Exclusion that skips only the named stages for matching paths.
    pub fn stages(pattern: &str, stages: Vec<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: compile_pattern(pattern)?,
            stages: Some(stages),
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    fn excludes_stage(&self, stage: &str) -> bool {
        match &self.stages {
            None => true,
            Some(names) => names.iter().any(|n| n == stage),
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Registry
// ============================================================================

/// Extension pattern plus its ordered stage chain and exclusions.
struct Descriptor {
    /// Bare extension, e.g. `js` (a config value of `*.js` normalizes
    /// to the same thing).
    ext: String,
    stages: Vec<Arc<dyn Transform>>,
    exclusions: Vec<Exclusion>,
}

/// Registered transform chains, matched first-registered-wins.
#[derive(Default)]
pub struct TransformRegistry {
    descriptors: Vec<Descriptor>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ordered stage chain for an extension pattern.
    ///
    /// Registering the same extension twice is a configuration error:
    /// the second registration could never win and almost certainly
    /// signals a copy-paste mistake.
    pub fn register(
        &mut self,
        pattern: &str,
        stages: Vec<Arc<dyn Transform>>,
        exclusions: Vec<Exclusion>,
    ) -> Result<(), ConfigError> {
        let ext = normalize_ext(pattern);
        if self.descriptors.iter().any(|d| d.ext == ext) {
            return Err(ConfigError::ConflictingTransform(ext));
        }
        self.descriptors.push(Descriptor {
            ext,
            stages,
            exclusions,
        });
        Ok(())
    }

    /// Resolve the stage chain for a path.
    ///
    /// Returns the stages of the first registered descriptor whose
    /// extension matches, with excluded stages removed for this path.
    /// No match (or everything excluded) yields an empty chain and the
    /// file passes through unchanged.
    pub fn resolve(&self, path: &Path) -> Vec<Arc<dyn Transform>> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Vec::new();
        };

        let Some(descriptor) = self.descriptors.iter().find(|d| d.ext == ext) else {
            return Vec::new();
        };

        let path_str = path.to_string_lossy();
        let active: Vec<&Exclusion> = descriptor
            .exclusions
            .iter()
            .filter(|x| x.matches(&path_str))
            .collect();

        descriptor
            .stages
            .iter()
            .filter(|stage| !active.iter().any(|x| x.excludes_stage(stage.name())))
            .cloned()
            .collect()
    }
}

/// Strip glob prefixes so `*.js`, `.js` and `js` all register the same key.
fn normalize_ext(pattern: &str) -> String {
    pattern
        .trim_start_matches("*.")
        .trim_start_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Stage that uppercases its input, for observing chain order.
    struct Upper;
    impl Transform for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn apply(&self, input: &[u8], _ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
            Ok(input.to_ascii_uppercase())
        }
    }

    /// Stage that appends a marker byte.
    struct Mark(u8);
    impl Transform for Mark {
        fn name(&self) -> &'static str {
            "mark"
        }
        fn apply(&self, input: &[u8], _ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
            let mut out = input.to_vec();
            out.push(self.0);
            Ok(out)
        }
    }

    fn ctx(path: &Path) -> StageContext<'_> {
        StageContext {
            source: path,
            entry: "app",
            kind: AssetKind::Script,
        }
    }

    #[test]
    fn test_resolve_no_match_is_empty() {
        let registry = TransformRegistry::new();
        assert!(registry.resolve(Path::new("a.js")).is_empty());
    }

    #[test]
    fn test_stages_apply_in_registration_order() {
        let mut registry = TransformRegistry::new();
        registry
            .register("js", vec![Arc::new(Upper), Arc::new(Mark(b'!'))], vec![])
            .unwrap();

        let path = PathBuf::from("a.js");
        let mut bytes = b"ab".to_vec();
        for stage in registry.resolve(&path) {
            bytes = stage.apply(&bytes, &ctx(&path)).unwrap();
        }
        assert_eq!(bytes, b"AB!");
    }

    #[test]
    fn test_first_registered_wins() {
        let mut registry = TransformRegistry::new();
        registry.register("js", vec![Arc::new(Upper)], vec![]).unwrap();
        // Same extension spelled differently still conflicts
        let err = registry
            .register("*.js", vec![Arc::new(Mark(b'x'))], vec![])
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingTransform(ext) if ext == "js"));

        let chain = registry.resolve(Path::new("a.js"));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].name(), "upper");
    }

    #[test]
    fn test_exclusion_skips_all_stages_but_keeps_passthrough() {
        let mut registry = TransformRegistry::new();
        registry
            .register(
                "js",
                vec![Arc::new(Upper)],
                vec![Exclusion::all("vendor").unwrap()],
            )
            .unwrap();

        assert!(registry.resolve(Path::new("static/js/vendor/jquery.js")).is_empty());
        assert_eq!(registry.resolve(Path::new("static/js/app/main.js")).len(), 1);
    }

    #[test]
    fn test_exclusion_removes_only_named_stages() {
        let mut registry = TransformRegistry::new();
        registry
            .register(
                "js",
                vec![Arc::new(Upper), Arc::new(Mark(b'!'))],
                vec![Exclusion::stages("vendor", vec!["upper".into()]).unwrap()],
            )
            .unwrap();

        let chain = registry.resolve(Path::new("vendor/lib.js"));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].name(), "mark");
    }

    #[test]
    fn test_ext_pattern_normalization() {
        let mut registry = TransformRegistry::new();
        registry.register("*.css", vec![Arc::new(Upper)], vec![]).unwrap();
        assert_eq!(registry.resolve(Path::new("x.css")).len(), 1);
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin("passthrough").is_some());
        assert!(builtin("minify-js").is_some());
        assert!(builtin("minify-css").is_some());
        assert!(builtin("no-such-stage").is_none());
    }
}
