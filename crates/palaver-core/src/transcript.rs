//! Conversation turns — an append-only log of user/agent exchanges.
//!
//! Turns are grouped by a free-form `conversation_id`; the grouping key is
//! not a foreign key into any other table, and sessions, meetings, and turns
//! remain fully uncoupled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which agent produced the response for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
  Weather,
  Document,
  Scheduling,
  Database,
  /// Fallback for messages no specialised agent claimed.
  General,
}

/// A stored conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
  pub id:              i64,
  /// Free-form grouping key; absent for one-off exchanges.
  pub conversation_id: Option<String>,
  pub user_message:    String,
  pub agent_response:  String,
  pub agent_kind:      AgentKind,
  /// Routing confidence, 0–100.
  pub confidence:      u8,
  /// Opaque side-channel data attached by the producing agent.
  pub extra_data:      Option<serde_json::Value>,
  /// Stamped by the store when the turn is logged.
  pub timestamp:       DateTime<Utc>,
}

/// Input to [`crate::store::TranscriptStore::log_turn`].
/// `id` and `timestamp` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewTurn {
  pub conversation_id: Option<String>,
  pub user_message:    String,
  pub agent_response:  String,
  pub agent_kind:      AgentKind,
  pub confidence:      u8,
  pub extra_data:      Option<serde_json::Value>,
}

impl NewTurn {
  /// Convenience constructor with all optional fields set to their defaults.
  pub fn new(
    user_message: impl Into<String>,
    agent_response: impl Into<String>,
    agent_kind: AgentKind,
  ) -> Self {
    Self {
      conversation_id: None,
      user_message: user_message.into(),
      agent_response: agent_response.into(),
      agent_kind,
      confidence: 0,
      extra_data: None,
    }
  }
}
