//! Build profiles: the resolved overlay of base configuration and a
//! development or production environment.
//!
//! Resolution is a pure merge over an explicit environment snapshot —
//! build logic never reads ambient environment variables. Overlay fields
//! are total-override: a field the profile sets always wins over the
//! config base.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::PipelineConfig;
use crate::manifest::MANIFEST_FILE;

/// Which profile governs a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Explicit snapshot of the environment variables the configurator
/// consumes. Captured once at startup; absence falls back to documented
/// defaults (`localhost`, port 2992, mode from the CLI command).
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub mode: Option<BuildMode>,
}

impl EnvSnapshot {
    /// Read `HOST`, `PORT` and `PACKLINE_ENV` from the process
    /// environment. This is the only place the pipeline touches env vars.
    pub fn capture() -> Self {
        Self {
            host: env::var("HOST").ok().filter(|h| !h.is_empty()),
            port: env::var("PORT").ok().and_then(|p| p.parse().ok()),
            mode: env::var("PACKLINE_ENV").ok().and_then(|m| parse_mode(&m)),
        }
    }
}

fn parse_mode(value: &str) -> Option<BuildMode> {
    match value.to_ascii_lowercase().as_str() {
        "production" | "prod" => Some(BuildMode::Production),
        "development" | "dev" => Some(BuildMode::Development),
        _ => None,
    }
}

/// Resolved configuration for exactly one run (or one continuous
/// dev-serving session). Never mutated mid-build.
#[derive(Debug, Clone)]
pub struct BuildProfile {
    pub mode: BuildMode,

    /// Output root for written artifacts and the manifest.
    pub output: PathBuf,
    /// Base of the public URLs recorded in the manifest.
    pub public_base: String,
    /// Prefixes stripped from logical manifest paths.
    pub ignore_paths: Vec<String>,

    pub minify: bool,
    pub compress: bool,
    pub clean: bool,
    pub source_map: bool,

    pub cors: bool,
    pub host: String,
    pub port: u16,
    pub watch: bool,
}

impl BuildProfile {
    /// Merge the base config with a profile over an environment snapshot.
    ///
    /// Production forces minification, compressed-copy emission, and
    /// output cleaning; development forces them off, enables the source
    /// map flag, and points the public base at the local listener.
    pub fn resolve(mode: BuildMode, config: &PipelineConfig, env: &EnvSnapshot) -> Self {
        let host = env.host.clone().unwrap_or_else(|| config.serve.host.clone());
        let port = env.port.unwrap_or(config.serve.port);

        match mode {
            BuildMode::Production => Self {
                mode,
                output: config.build.output.clone(),
                public_base: config.build.public_base.clone(),
                ignore_paths: config.build.ignore_paths.clone(),
                minify: true,
                compress: true,
                clean: true,
                source_map: false,
                cors: false,
                host,
                port,
                watch: false,
            },
            BuildMode::Development => Self {
                mode,
                output: config.build.output.clone(),
                // Artifacts are served from the listener, so manifest
                // URLs point at it.
                public_base: format!("http://{host}:{port}"),
                ignore_paths: config.build.ignore_paths.clone(),
                minify: false,
                compress: false,
                clean: false,
                source_map: true,
                cors: config.serve.cors,
                host,
                port,
                watch: config.serve.watch,
            },
        }
    }

    /// Public URL for an output filename under this profile's base.
    pub fn public_url(&self, output_name: &str) -> String {
        if self.public_base.is_empty() {
            return output_name.to_string();
        }
        format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            output_name.trim_start_matches('/')
        )
    }

    /// Manifest location inside the output root.
    pub fn manifest_path(&self) -> PathBuf {
        self.output.join(MANIFEST_FILE)
    }

    /// Bare profile for unit tests elsewhere in the crate.
    #[cfg(test)]
    pub fn base_for_tests(mode: BuildMode) -> Self {
        Self {
            mode,
            output: PathBuf::from("dist"),
            public_base: String::new(),
            ignore_paths: Vec::new(),
            minify: false,
            compress: false,
            clean: false,
            source_map: false,
            cors: false,
            host: "localhost".to_string(),
            port: 2992,
            watch: false,
        }
    }
}
