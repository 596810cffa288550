//! Top-level error of a build run.

use crate::build::descriptor::RefParseError;
use crate::build::discovery::DiscoveryError;
use crate::build::registry::NotFoundError;
use crate::build::store::StoreError;
use crate::config::ConfigError;
use thiserror::Error;

/// Fatal error that aborts a run.
///
/// A task reporting a failure is not an error; it is carried in the
/// pipeline result instead.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Configuration failed to load or validate
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A task, target, pipeline or implementation is unknown
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    /// A command-line reference is malformed
    #[error(transparent)]
    Reference(#[from] RefParseError),
    /// Input expansion failed
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Reading or writing an artifact failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BuildError {
    /// Whether the error comes from configuration or name resolution
    /// rather than from the file system.
    pub fn is_configuration(&self) -> bool {
        match self {
            BuildError::Config(ConfigError::Io(_)) => false,
            BuildError::Config(_) | BuildError::NotFound(_) | BuildError::Reference(_) => true,
            BuildError::Discovery(DiscoveryError::InvalidPattern(_, _)) => true,
            BuildError::Discovery(DiscoveryError::Io(_)) | BuildError::Store(_) => false,
        }
    }
}
