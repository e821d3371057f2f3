//! `[[transform]]` section configuration.
//!
//! Registers an ordered stage chain for an extension. Registration order
//! is the precedence order: the first registered pattern that matches a
//! path wins.
//!
//! # Example
//!
//! ```toml
//! [[transform]]
//! ext = "js"
//! stages = ["minify-js"]
//! exclude = ["vendor"]          # matching paths skip every stage
//!
//! [[transform]]
//! ext = "css"
//! stages = ["minify-css"]
//!
//! # Or skip only specific stages for matching paths:
//! # [[transform.exclude_stages]]
//! # pattern = "vendor"
//! # stages = ["minify-js"]
//! ```

use serde::{Deserialize, Serialize};

/// Skip only the named stages for paths matching `pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageExclusion {
    /// Regex matched against the full source path.
    pub pattern: String,
    pub stages: Vec<String>,
}

/// One registered transform chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Extension pattern (`js`, `.js` and `*.js` are equivalent).
    pub ext: String,

    /// Ordered stage names; each stage's output is the next stage's input.
    pub stages: Vec<String>,

    /// Patterns whose matches skip every stage of this chain while still
    /// concatenating into their bundle.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Finer-grained exclusions that skip only specific stages.
    #[serde(default)]
    pub exclude_stages: Vec<StageExclusion>,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_transform_config() {
        let config = test_parse_config(
            "[[transform]]\next = \"js\"\nstages = [\"minify-js\"]\nexclude = [\"vendor\"]",
        );

        assert_eq!(config.transforms.len(), 1);
        let transform = &config.transforms[0];
        assert_eq!(transform.ext, "js");
        assert_eq!(transform.stages, ["minify-js"]);
        assert_eq!(transform.exclude, ["vendor"]);
        assert!(transform.exclude_stages.is_empty());
    }

    #[test]
    fn test_stage_exclusion_form() {
        let config = test_parse_config(
            "[[transform]]\next = \"js\"\nstages = [\"minify-js\"]\n\
             [[transform.exclude_stages]]\npattern = \"vendor\"\nstages = [\"minify-js\"]",
        );

        let transform = &config.transforms[0];
        assert_eq!(transform.exclude_stages.len(), 1);
        assert_eq!(transform.exclude_stages[0].pattern, "vendor");
    }
}
