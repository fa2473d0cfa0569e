//! Chat sessions — a unique mapping from an opaque external identifier to an
//! arbitrary structured context document.
//!
//! The store never interprets, validates, or indexes the internals of
//! `context`; it is persisted and returned verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
  /// Store-assigned surrogate key.
  pub id:         i64,
  /// Caller-supplied identifier; unique across all rows at any time.
  pub session_id: String,
  /// Opaque conversational context. No fixed shape.
  pub context:    Option<serde_json::Value>,
  /// Stamped by the store at creation.
  pub created_at: DateTime<Utc>,
}
