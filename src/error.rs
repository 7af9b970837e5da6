use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the `wirebox` container.
///
/// Every variant is fatal to the operation that raised it; nothing is retried
/// internally and no partial state is rolled back. A `get` on an unknown
/// service name is the one expected non-error outcome and is reported as
/// `Ok(None)`, never through this type.
#[derive(Debug, Error)]
pub enum Error {
  #[error("container can not be built: {0}")]
  ConfigurationMissing(String),

  #[error("definition document not found: {}", .0.display())]
  DocumentNotFound(PathBuf),

  #[error("failed to parse definition document: {0}")]
  DocumentParse(String),

  #[error("invalid definition for service '{service}': {reason}")]
  InvalidDefinition { service: String, reason: String },

  #[error("service '{service}' requires parameter '{parameter}', not set")]
  MissingParameter { service: String, parameter: String },

  #[error("missing collaborator: {0}")]
  MissingCollaborator(String),

  #[error("circular reference while resolving service '{service}'")]
  CircularReference { service: String },

  #[error("service '{name}' not defined in container (referenced by '{service}')")]
  UnknownService { service: String, name: String },

  #[error("invalid call for service '{service}': {reason}")]
  InvalidCall { service: String, reason: String },

  #[error("no factory registered for class '{class}' (service '{service}')")]
  MissingFactory { service: String, class: String },
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
