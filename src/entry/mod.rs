//! Entry graph: named, ordered bundles of source files.
//!
//! An [`Entry`] is a logical bundle name plus an ordered list of
//! [`SourceRef`]s of one kind. Order is load-bearing: scripts with implicit
//! global side effects (jQuery-style vendor libraries) must concatenate in
//! declaration order.

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// ============================================================================
// AssetKind
// ============================================================================

/// Kind of asset a source file (and the bundle it belongs to) produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// Application JavaScript.
    Script,
    /// Stylesheet.
    Style,
    /// Third-party JavaScript that concatenates into its bundle but is
    /// exempt from lint/minify stages via registry exclusions.
    VendorScript,
}

impl AssetKind {
    /// File extension of the built artifact for this kind.
    pub const fn output_ext(self) -> &'static str {
        match self {
            Self::Script | Self::VendorScript => "js",
            Self::Style => "css",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::VendorScript => "vendor-script",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SourceRef / Entry
// ============================================================================

/// A single source file reference within an entry.
///
/// Immutable once the build starts; belongs to exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Absolute path to the source file.
    pub path: PathBuf,
    /// Kind inherited from the owning entry.
    pub kind: AssetKind,
}

/// A named, ordered bundle of source references of one kind.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub kind: AssetKind,
    /// Ordered: concatenation and evaluation order follow this list.
    pub sources: Vec<SourceRef>,
}

impl Entry {
    /// Logical output filename, e.g. `app.js`.
    pub fn logical_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.output_ext())
    }

    /// Whether any of this entry's sources is the given path.
    pub fn contains_source(&self, path: &Path) -> bool {
        self.sources.iter().any(|s| s.path == path)
    }
}

// ============================================================================
// EntryGraph
// ============================================================================

/// All declared entries for one build configuration, in declaration order.
///
/// Declaration order only affects manifest iteration order, but it must be
/// deterministic so two builds of the same config serialize identical
/// manifests.
#[derive(Debug, Default)]
pub struct EntryGraph {
    entries: Vec<Entry>,
    names: FxHashSet<String>,
}

impl EntryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entry.
    ///
    /// Fails if the name is already taken or the source list is empty;
    /// both are configuration mistakes that must surface before any build
    /// work starts.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        kind: AssetKind,
        sources: Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        let name = name.into();

        if !self.names.insert(name.clone()) {
            return Err(ConfigError::DuplicateEntry(name));
        }
        if sources.is_empty() {
            return Err(ConfigError::EmptyEntry(name));
        }

        let sources = sources
            .into_iter()
            .map(|path| SourceRef { path, kind })
            .collect();

        self.entries.push(Entry {
            name,
            kind,
            sources,
        });
        Ok(())
    }

    /// All entries in declaration order.
    pub fn resolve_all(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up one entry by name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Names of entries that reference the given source path.
    ///
    /// Used by watch mode to scope rebuilds to dirty entries.
    pub fn entries_for_source(&self, path: &Path) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.contains_source(path))
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verify every declared source path exists on disk.
    pub fn validate_sources(&self) -> Result<(), ConfigError> {
        for entry in &self.entries {
            for source in &entry.sources {
                if !source.path.is_file() {
                    return Err(ConfigError::MissingSource {
                        entry: entry.name.clone(),
                        path: source.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_define_preserves_declaration_order() {
        let mut graph = EntryGraph::new();
        graph
            .define("vendor", AssetKind::VendorScript, paths(&["v.js"]))
            .unwrap();
        graph
            .define("app", AssetKind::Script, paths(&["a.js", "b.js"]))
            .unwrap();
        graph
            .define("style", AssetKind::Style, paths(&["x.css"]))
            .unwrap();

        let names: Vec<_> = graph.resolve_all().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["vendor", "app", "style"]);
    }

    #[test]
    fn test_duplicate_entry_name_rejected() {
        let mut graph = EntryGraph::new();
        graph
            .define("app", AssetKind::Script, paths(&["a.js"]))
            .unwrap();
        let err = graph
            .define("app", AssetKind::Style, paths(&["x.css"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEntry(name) if name == "app"));
    }

    #[test]
    fn test_empty_source_list_rejected() {
        let mut graph = EntryGraph::new();
        let err = graph.define("app", AssetKind::Script, vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyEntry(_)));
    }

    #[test]
    fn test_source_order_preserved() {
        let mut graph = EntryGraph::new();
        graph
            .define("app", AssetKind::Script, paths(&["a.js", "b.js", "c.js"]))
            .unwrap();

        let entry = graph.get("app").unwrap();
        let sources: Vec<_> = entry
            .sources
            .iter()
            .map(|s| s.path.to_str().unwrap())
            .collect();
        assert_eq!(sources, ["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_entries_for_source() {
        let mut graph = EntryGraph::new();
        graph
            .define("app", AssetKind::Script, paths(&["shared.js", "a.js"]))
            .unwrap();
        graph
            .define("admin", AssetKind::Script, paths(&["shared.js"]))
            .unwrap();

        let owners = graph.entries_for_source(Path::new("shared.js"));
        assert_eq!(owners, ["app", "admin"]);
        assert!(graph.entries_for_source(Path::new("other.js")).is_empty());
    }

    #[test]
    fn test_logical_name_uses_kind_extension() {
        let mut graph = EntryGraph::new();
        graph
            .define("style", AssetKind::Style, paths(&["x.css"]))
            .unwrap();
        assert_eq!(graph.get("style").unwrap().logical_name(), "style.css");
    }
}
