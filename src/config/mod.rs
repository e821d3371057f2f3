//! Pipeline configuration management for `packline.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── entries    # [[entry]]
//! │   ├── transforms # [[transform]]
//! │   ├── build      # [build]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError
//! ├── profile        # BuildMode, EnvSnapshot, BuildProfile
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The static declaration surface is the boundary contract: entries,
//! transform registrations, output root, public base URL, and the
//! ignore-path list all come from here and are immutable for a run.

mod error;
mod profile;
pub mod section;

pub use error::ConfigError;
pub use profile::{BuildMode, BuildProfile, EnvSnapshot};
pub use section::{BuildConfig, EntryConfig, ServeConfig, StageExclusion, TransformConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entry::EntryGraph;
use crate::transform::{Exclusion, TransformRegistry, builtin};
use crate::utils::path::normalize_path;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing packline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Declared bundles, in declaration order
    #[serde(default, rename = "entry")]
    pub entries: Vec<EntryConfig>,

    /// Transform registrations, in precedence order
    #[serde(default, rename = "transform")]
    pub transforms: Vec<TransformConfig>,

    /// Build output settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl PipelineConfig {
    /// Load configuration from a file path.
    ///
    /// The project root is the config file's parent directory; all
    /// relative source and output paths resolve against it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let mut config = Self::from_str(&content)?;
        config.config_path = normalize_path(path);
        config.root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        // Surface configuration mistakes before any build work: a bad
        // stage name or duplicate entry must not fail mid-run.
        config.entry_graph()?.validate_sources()?;
        config.registry(true)?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Join a path with the project root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    // ========================================================================
    // derived build inputs
    // ========================================================================

    /// Build the entry graph, resolving sources against the project root.
    pub fn entry_graph(&self) -> Result<EntryGraph, ConfigError> {
        let mut graph = EntryGraph::new();
        for entry in &self.entries {
            let sources = entry
                .sources
                .iter()
                .map(|p| if p.is_absolute() { p.clone() } else { self.root_join(p) })
                .collect();
            graph.define(entry.name.clone(), entry.kind, sources)?;
        }
        Ok(graph)
    }

    /// Build the transform registry for one run.
    ///
    /// Stage names resolve against the builtin set; unknown names are
    /// configuration errors even when `minify` filtering would drop them.
    /// With `minify` off (development profile), `minify-*` stages are
    /// filtered out without touching the registration contract.
    pub fn registry(&self, minify: bool) -> Result<TransformRegistry, ConfigError> {
        let mut registry = TransformRegistry::new();

        for transform in &self.transforms {
            let mut stages = Vec::with_capacity(transform.stages.len());
            for name in &transform.stages {
                let stage = builtin(name).ok_or_else(|| ConfigError::UnknownStage {
                    ext: transform.ext.clone(),
                    stage: name.clone(),
                })?;
                if !minify && name.starts_with("minify-") {
                    continue;
                }
                stages.push(stage);
            }

            let mut exclusions = Vec::new();
            for pattern in &transform.exclude {
                exclusions.push(Exclusion::all(pattern)?);
            }
            for exclusion in &transform.exclude_stages {
                exclusions.push(Exclusion::stages(
                    &exclusion.pattern,
                    exclusion.stages.clone(),
                )?);
            }

            registry.register(&transform.ext, stages, exclusions)?;
        }

        Ok(registry)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from a TOML snippet. Panics on parse errors.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    PipelineConfig::from_str(content).expect("test config failed to parse")
}

// ============================================================================
// tests
// ============================================================================
