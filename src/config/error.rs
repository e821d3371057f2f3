//! Configuration error types.
//!
//! Everything here is fatal at startup, before any build work.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate entry name `{0}`")]
    DuplicateEntry(String),

    #[error("entry `{0}` declares no sources")]
    EmptyEntry(String),

    #[error("entry `{entry}`: source `{}` does not exist", .path.display())]
    MissingSource { entry: String, path: PathBuf },

    #[error("transform for extension `{0}` registered twice")]
    ConflictingTransform(String),

    #[error("transform for `{ext}` names unknown stage `{stage}`")]
    UnknownStage { ext: String, stage: String },

    #[error("invalid exclusion pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_error_display_names_offender() {
        let err = ConfigError::DuplicateEntry("app".into());
        assert!(err.to_string().contains("app"));

        let err = ConfigError::MissingSource {
            entry: "app".into(),
            path: PathBuf::from("static/js/main.js"),
        };
        assert!(err.to_string().contains("main.js"));

        let err = ConfigError::Io(
            PathBuf::from("packline.toml"),
            Error::new(ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("packline.toml"));
    }
}
