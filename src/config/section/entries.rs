//! `[[entry]]` section configuration.
//!
//! Each entry declares one named bundle: a kind and an ordered source
//! list. Array-of-tables keeps declaration order, which fixes manifest
//! iteration order.
//!
//! # Example
//!
//! ```toml
//! [[entry]]
//! name = "vendor"
//! kind = "vendor-script"
//! sources = [
//!   "static/js/vendor/jquery-3.2.1.slim.js",
//!   "static/js/vendor/tether.js",
//!   "static/js/vendor/bootstrap.js",
//! ]
//!
//! [[entry]]
//! name = "app"
//! kind = "script"
//! sources = ["static/js/app/main.js"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entry::AssetKind;

/// One declared bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Logical bundle name; must be unique across entries.
    pub name: String,

    /// Asset kind: `script`, `style`, or `vendor-script`.
    pub kind: AssetKind,

    /// Ordered source paths, relative to the project root.
    /// Concatenation and evaluation order follow this list.
    pub sources: Vec<PathBuf>,
}
