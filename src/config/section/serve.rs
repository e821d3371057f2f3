//! `[serve]` section configuration.
//!
//! Development listener settings. The environment variables `HOST` and
//! `PORT` (captured once at startup) override these fields.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! host = "localhost"   # Bind host (use "0.0.0.0" for LAN access)
//! port = 2992          # HTTP port number
//! watch = true         # Rebuild dirty entries on file changes
//! cors = true          # Send Access-Control-Allow-Origin: *
//! ```

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Bind host.
    pub host: String,

    /// HTTP port number.
    pub port: u16,

    /// Enable file watcher for scoped rebuilds.
    pub watch: bool,

    /// Allow cross-origin requests (the manifest's public base usually
    /// points at a different origin than the page server in development).
    pub cors: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2992,
            watch: true,
            cors: true,
        }
    }
}
