//! Error type for `palaver-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] palaver_core::Error),

  /// The underlying storage medium could not be reached or failed.
  #[error("storage unavailable: {0}")]
  Unavailable(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An insert would violate the uniqueness of `chat_sessions.session_id`.
  #[error("duplicate session id: {0:?}")]
  DuplicateSessionId(String),

  /// A lookup or update by `session_id` matched no row.
  #[error("session not found: {0:?}")]
  SessionNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Whether `err` is SQLite rejecting a write for violating a UNIQUE index.
pub(crate) fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
