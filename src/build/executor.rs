//! Entry build execution.
//!
//! Entries build in parallel (no ordering dependency exists between
//! different entries); within one entry the work is strictly sequential in
//! source order, because concatenation order must equal declaration order.

use std::fs;

use rayon::prelude::*;

use super::{Artifact, BuildError};
use crate::entry::{Entry, EntryGraph};
use crate::transform::{StageContext, TransformRegistry};

/// Build one entry into an artifact.
///
/// For each source in declaration order: read bytes, resolve the transform
/// chain, apply stages in registration order (each stage's output feeds
/// the next), then append to the artifact payload. A stage failure aborts
/// the whole entry with the offending source path and stage identity.
pub fn build_entry(entry: &Entry, registry: &TransformRegistry) -> Result<Artifact, BuildError> {
    let mut payload = Vec::new();

    for source in &entry.sources {
        let mut bytes = fs::read(&source.path).map_err(|e| BuildError::ReadSource {
            entry: entry.name.clone(),
            path: source.path.clone(),
            source: e,
        })?;

        let ctx = StageContext {
            source: &source.path,
            entry: &entry.name,
            kind: source.kind,
        };

        for stage in registry.resolve(&source.path) {
            bytes = stage
                .apply(&bytes, &ctx)
                .map_err(|e| BuildError::Transform {
                    entry: entry.name.clone(),
                    path: source.path.clone(),
                    stage: stage.name(),
                    source: e,
                })?;
        }

        payload.extend_from_slice(&bytes);
    }

    Ok(Artifact {
        name: entry.name.clone(),
        kind: entry.kind,
        bytes: payload,
    })
}

/// Build every entry of the graph in parallel.
///
/// Acts as the barrier the manifest writer depends on: either every entry
/// built, or the first error is returned and no artifact set exists. The
/// returned artifacts keep declaration order regardless of which worker
/// finished first.
pub fn build_all(
    graph: &EntryGraph,
    registry: &TransformRegistry,
) -> Result<Vec<Artifact>, BuildError> {
    graph
        .resolve_all()
        .par_iter()
        .map(|entry| build_entry(entry, registry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AssetKind;
    use crate::transform::{Exclusion, StageError, Transform};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Upper;
    impl Transform for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn apply(&self, input: &[u8], _ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
            Ok(input.to_ascii_uppercase())
        }
    }

    struct AlwaysFail;
    impl Transform for AlwaysFail {
        fn name(&self) -> &'static str {
            "always-fail"
        }
        fn apply(&self, _input: &[u8], _ctx: &StageContext<'_>) -> Result<Vec<u8>, StageError> {
            Err(StageError::Failed("boom".into()))
        }
    }

    fn write_sources(dir: &TempDir, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_concatenation_preserves_declaration_order() {
        let dir = TempDir::new().unwrap();
        let sources = write_sources(&dir, &[("a.js", "aaa;"), ("b.js", "bbb;"), ("c.js", "ccc;")]);

        let mut graph = EntryGraph::new();
        graph.define("app", AssetKind::Script, sources).unwrap();

        let registry = TransformRegistry::new();
        let artifact = build_entry(graph.get("app").unwrap(), &registry).unwrap();
        assert_eq!(artifact.bytes, b"aaa;bbb;ccc;");
    }

    #[test]
    fn test_transform_applies_per_source() {
        let dir = TempDir::new().unwrap();
        let sources = write_sources(&dir, &[("a.js", "ab"), ("b.txt", "cd")]);

        let mut graph = EntryGraph::new();
        graph.define("app", AssetKind::Script, sources).unwrap();

        let mut registry = TransformRegistry::new();
        registry.register("js", vec![Arc::new(Upper)], vec![]).unwrap();

        // Only the .js source matches the chain; the .txt passes through
        let artifact = build_entry(graph.get("app").unwrap(), &registry).unwrap();
        assert_eq!(artifact.bytes, b"ABcd");
    }

    #[test]
    fn test_excluded_source_still_concatenates() {
        let dir = TempDir::new().unwrap();
        let sources = write_sources(&dir, &[("vendor/lib.js", "lib"), ("main.js", "main")]);

        let mut graph = EntryGraph::new();
        graph.define("app", AssetKind::Script, sources).unwrap();

        let mut registry = TransformRegistry::new();
        registry
            .register(
                "js",
                vec![Arc::new(Upper)],
                vec![Exclusion::all("vendor").unwrap()],
            )
            .unwrap();

        let artifact = build_entry(graph.get("app").unwrap(), &registry).unwrap();
        // vendor skips the stage but keeps its place in the bundle
        assert_eq!(artifact.bytes, b"libMAIN");
    }

    #[test]
    fn test_stage_failure_reports_source_and_stage() {
        let dir = TempDir::new().unwrap();
        let sources = write_sources(&dir, &[("ok.js", "ok"), ("bad.js", "bad")]);

        let mut graph = EntryGraph::new();
        graph.define("app", AssetKind::Script, sources).unwrap();

        let mut registry = TransformRegistry::new();
        registry
            .register(
                "js",
                vec![Arc::new(AlwaysFail)],
                vec![Exclusion::all("ok").unwrap()],
            )
            .unwrap();

        let err = build_entry(graph.get("app").unwrap(), &registry).unwrap_err();
        match err {
            BuildError::Transform { entry, path, stage, .. } => {
                assert_eq!(entry, "app");
                assert!(path.ends_with("bad.js"));
                assert_eq!(stage, "always-fail");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_source_fails_with_path() {
        let mut graph = EntryGraph::new();
        graph
            .define("app", AssetKind::Script, vec![PathBuf::from("/no/such/file.js")])
            .unwrap();

        let registry = TransformRegistry::new();
        let err = build_entry(graph.get("app").unwrap(), &registry).unwrap_err();
        assert!(matches!(err, BuildError::ReadSource { .. }));
    }

    #[test]
    fn test_build_all_keeps_declaration_order() {
        let dir = TempDir::new().unwrap();
        let a = write_sources(&dir, &[("a.js", "a")]);
        let x = write_sources(&dir, &[("x.css", "x")]);

        let mut graph = EntryGraph::new();
        graph.define("app", AssetKind::Script, a).unwrap();
        graph.define("style", AssetKind::Style, x).unwrap();

        let registry = TransformRegistry::new();
        let artifacts = build_all(&graph, &registry).unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.logical_name()).collect();
        assert_eq!(names, ["app.js", "style.css"]);
    }

    #[test]
    fn test_build_all_fails_when_any_entry_fails() {
        let dir = TempDir::new().unwrap();
        let good = write_sources(&dir, &[("good.js", "ok")]);

        let mut graph = EntryGraph::new();
        graph.define("good", AssetKind::Script, good).unwrap();
        graph
            .define("bad", AssetKind::Script, vec![PathBuf::from("/missing.js")])
            .unwrap();

        let registry = TransformRegistry::new();
        let err = build_all(&graph, &registry).unwrap_err();
        assert_eq!(err.entry(), Some("bad"));
    }
}
