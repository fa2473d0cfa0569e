//! Error types for `palaver-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or empty, or a length cap is exceeded.
  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("duplicate session id: {0:?}")]
  DuplicateSessionId(String),

  #[error("session not found: {0:?}")]
  SessionNotFound(String),

  #[error("unknown agent kind discriminant: {0:?}")]
  UnknownAgentKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
