//! Error types for gatehouse-cli

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for gatehouse-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gatehouse-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from gatehouse-acl
    #[error("ACL error: {0}")]
    Acl(#[from] gatehouse_acl::Error),

    /// Policy file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Policy file is not valid TOML for the expected schema
    #[error("Failed to parse policy: {0}")]
    Toml(#[from] toml::de::Error),

    /// Policy file is structurally invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Named object is not defined in the policy
    #[error("Unknown object: {0}")]
    UnknownObject(String),
}

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Creates an I/O error tagged with the path being accessed.
    pub fn io_with_path(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
