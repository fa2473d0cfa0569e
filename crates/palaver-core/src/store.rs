//! The store traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `palaver-store-sqlite`). The three stores are independent data containers;
//! nothing couples a meeting to a session or a turn, so each container gets
//! its own trait and a backend may implement any subset.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  meeting::{Meeting, NewMeeting},
  session::ChatSession,
  transcript::{NewTurn, Turn},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`MeetingStore::find_meetings`] and
/// [`MeetingStore::count_meetings`].
#[derive(Debug, Clone, Default)]
pub struct MeetingQuery {
  /// Inclusive lower bound on the meeting date.
  pub after:    Option<NaiveDate>,
  /// Inclusive upper bound on the meeting date.
  pub before:   Option<NaiveDate>,
  /// Exact-match filter on the team.
  pub team:     Option<String>,
  /// Substring filter on the location.
  pub location: Option<String>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

// ─── Meetings ────────────────────────────────────────────────────────────────

/// Abstraction over the meeting record container.
///
/// Meetings are append-only: no update or delete operation exists. The store
/// assigns ids and stamps `created_at`; callers supply neither.
pub trait MeetingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Validate and persist a new meeting, returning the stored record with
  /// its assigned id.
  fn insert_meeting(
    &self,
    input: NewMeeting,
  ) -> impl Future<Output = Result<Meeting, Self::Error>> + Send + '_;

  /// All meetings on exactly `date`. An empty vec, not an error, when none
  /// match.
  fn meetings_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Meeting>, Self::Error>> + Send + '_;

  /// All meetings for exactly `team`. An empty vec, not an error, when none
  /// match.
  fn meetings_for_team<'a>(
    &'a self,
    team: &'a str,
  ) -> impl Future<Output = Result<Vec<Meeting>, Self::Error>> + Send + 'a;

  /// Filtered listing, ordered by date ascending.
  fn find_meetings<'a>(
    &'a self,
    query: &'a MeetingQuery,
  ) -> impl Future<Output = Result<Vec<Meeting>, Self::Error>> + Send + 'a;

  /// Number of meetings matching `query`, ignoring its limit/offset.
  fn count_meetings<'a>(
    &'a self,
    query: &'a MeetingQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

// ─── Chat sessions ───────────────────────────────────────────────────────────

/// Abstraction over the chat session container.
///
/// `session_id` uniquely identifies at most one row at any time. Concurrent
/// creates for the same identifier resolve to exactly one success; the loser
/// observes a duplicate-id error rather than silently overwriting.
pub trait SessionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a session for a previously unseen `session_id`.
  ///
  /// `session_id` must be non-empty. `context`, if provided, is stored
  /// opaquely and returned verbatim on later reads.
  fn create_session<'a>(
    &'a self,
    session_id: &'a str,
    context: Option<serde_json::Value>,
  ) -> impl Future<Output = Result<ChatSession, Self::Error>> + Send + 'a;

  /// Exact-match lookup. A miss is an error, not a default session.
  fn get_session<'a>(
    &'a self,
    session_id: &'a str,
  ) -> impl Future<Output = Result<ChatSession, Self::Error>> + Send + 'a;

  /// Replace the session's context document wholesale.
  ///
  /// The replacement is atomic with respect to concurrent readers: they see
  /// either the previous document or `context`, never a blend. Errors when
  /// the session does not exist.
  fn update_context<'a>(
    &'a self,
    session_id: &'a str,
    context: serde_json::Value,
  ) -> impl Future<Output = Result<ChatSession, Self::Error>> + Send + 'a;
}

// ─── Conversation turns ──────────────────────────────────────────────────────

/// Abstraction over the conversation turn log.
pub trait TranscriptStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append one exchange to the log. The `timestamp` is set by the store.
  fn log_turn(
    &self,
    input: NewTurn,
  ) -> impl Future<Output = Result<Turn, Self::Error>> + Send + '_;

  /// All turns with the given `conversation_id`, oldest first. An empty vec
  /// when the conversation is unknown.
  fn turns_for<'a>(
    &'a self,
    conversation_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Turn>, Self::Error>> + Send + 'a;
}
