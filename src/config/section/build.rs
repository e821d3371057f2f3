//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "static/dist"        # Output root for written artifacts
//! public_base = "/static/dist"  # Base of public URLs in the manifest
//! ignore_paths = ["/fonts", "/scss"]  # Prefixes stripped from manifest paths
//! minify = true                 # Base value; profiles override per mode
//! compress = false              # Emit .gz copies (production forces on)
//! clean = false                 # Clear output root first (production forces on)
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Build output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root for written artifacts and the manifest.
    pub output: PathBuf,

    /// Base of the public URLs recorded in the manifest.
    pub public_base: String,

    /// Path prefixes stripped from logical manifest paths.
    pub ignore_paths: Vec<String>,

    /// Run minify stages. The production profile forces this on and the
    /// development profile forces it off; the config value feeds the base.
    pub minify: bool,

    /// Emit a gzip copy next to each written artifact.
    pub compress: bool,

    /// Remove the output root before writing.
    pub clean: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
            public_base: String::new(),
            ignore_paths: Vec::new(),
            minify: true,
            compress: false,
            clean: false,
        }
    }
}
