//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use palaver_core::{
  meeting::{NewMeeting, TEAM_MAX_LEN},
  store::{MeetingQuery, MeetingStore, SessionStore, TranscriptStore},
  transcript::{AgentKind, NewTurn},
};
use serde_json::json;

use crate::{Error, SqliteStore, migrations};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(s: &str) -> NaiveDate { s.parse().expect("test date") }

fn falcons_meeting() -> NewMeeting {
  let mut input = NewMeeting::new(date("2024-05-01"), "Falcons");
  input.location = Some("Field A".into());
  input
}

// ─── Meetings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_query_by_date() {
  let s = store().await;

  let meeting = s.insert_meeting(falcons_meeting()).await.unwrap();
  assert_eq!(meeting.id, 1);
  assert_eq!(meeting.team, "Falcons");

  let found = s.meetings_on(date("2024-05-01")).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].team, "Falcons");
  assert_eq!(found[0].location.as_deref(), Some("Field A"));
}

#[tokio::test]
async fn meetings_on_empty_date_returns_empty_vec() {
  let s = store().await;
  let found = s.meetings_on(date("1999-01-01")).await.unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn query_by_team() {
  let s = store().await;

  s.insert_meeting(NewMeeting::new(date("2024-05-01"), "Falcons"))
    .await
    .unwrap();
  s.insert_meeting(NewMeeting::new(date("2024-05-02"), "Otters"))
    .await
    .unwrap();
  s.insert_meeting(NewMeeting::new(date("2024-05-03"), "Falcons"))
    .await
    .unwrap();

  let falcons = s.meetings_for_team("Falcons").await.unwrap();
  assert_eq!(falcons.len(), 2);
  assert!(falcons.iter().all(|m| m.team == "Falcons"));

  let none = s.meetings_for_team("Herons").await.unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn insert_rejects_empty_team_and_stores_nothing() {
  let s = store().await;

  let err = s
    .insert_meeting(NewMeeting::new(date("2024-05-01"), "   "))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(palaver_core::Error::ConstraintViolation(_))
  ));

  // No partial record may remain after a rejected insert.
  let count = s.count_meetings(&MeetingQuery::default()).await.unwrap();
  assert_eq!(count, 0);
}

#[tokio::test]
async fn insert_rejects_overlong_team() {
  let s = store().await;

  let long_team = "x".repeat(TEAM_MAX_LEN + 1);
  let err = s
    .insert_meeting(NewMeeting::new(date("2024-05-01"), long_team))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(palaver_core::Error::ConstraintViolation(_))
  ));
}

#[tokio::test]
async fn optional_fields_roundtrip() {
  let s = store().await;

  let mut input = NewMeeting::new(date("2024-06-10"), "Otters");
  input.description = Some("quarterly sync".into());
  input.weather_conditions = Some("light rain, 12C".into());
  s.insert_meeting(input).await.unwrap();

  let found = s.meetings_on(date("2024-06-10")).await.unwrap();
  assert_eq!(found[0].description.as_deref(), Some("quarterly sync"));
  assert_eq!(
    found[0].weather_conditions.as_deref(),
    Some("light rain, 12C")
  );
  assert_eq!(found[0].location, None);
}

#[tokio::test]
async fn meeting_ids_increase() {
  let s = store().await;

  let first = s.insert_meeting(falcons_meeting()).await.unwrap();
  let second = s.insert_meeting(falcons_meeting()).await.unwrap();
  assert!(second.id > first.id);
}

#[tokio::test]
async fn find_meetings_date_range_ordered() {
  let s = store().await;

  for day in ["2024-05-03", "2024-05-01", "2024-05-07", "2024-04-30"] {
    s.insert_meeting(NewMeeting::new(date(day), "Falcons"))
      .await
      .unwrap();
  }

  let query = MeetingQuery {
    after: Some(date("2024-05-01")),
    before: Some(date("2024-05-07")),
    ..Default::default()
  };
  let found = s.find_meetings(&query).await.unwrap();

  let dates: Vec<_> = found.iter().map(|m| m.date).collect();
  assert_eq!(
    dates,
    vec![date("2024-05-01"), date("2024-05-03"), date("2024-05-07")]
  );
}

#[tokio::test]
async fn find_meetings_by_location_substring() {
  let s = store().await;

  let mut north = NewMeeting::new(date("2024-05-01"), "Falcons");
  north.location = Some("North Field".into());
  s.insert_meeting(north).await.unwrap();

  let mut office = NewMeeting::new(date("2024-05-01"), "Falcons");
  office.location = Some("Main Office".into());
  s.insert_meeting(office).await.unwrap();

  let query = MeetingQuery {
    location: Some("Field".into()),
    ..Default::default()
  };
  let found = s.find_meetings(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].location.as_deref(), Some("North Field"));
}

#[tokio::test]
async fn find_meetings_limit_and_offset() {
  let s = store().await;

  for day in ["2024-05-01", "2024-05-02", "2024-05-03"] {
    s.insert_meeting(NewMeeting::new(date(day), "Falcons"))
      .await
      .unwrap();
  }

  let query = MeetingQuery {
    limit: Some(2),
    offset: Some(1),
    ..Default::default()
  };
  let found = s.find_meetings(&query).await.unwrap();
  assert_eq!(found.len(), 2);
  assert_eq!(found[0].date, date("2024-05-02"));
  assert_eq!(found[1].date, date("2024-05-03"));
}

#[tokio::test]
async fn count_meetings_respects_filters() {
  let s = store().await;

  s.insert_meeting(NewMeeting::new(date("2024-05-01"), "Falcons"))
    .await
    .unwrap();
  s.insert_meeting(NewMeeting::new(date("2024-05-02"), "Otters"))
    .await
    .unwrap();

  let all = s.count_meetings(&MeetingQuery::default()).await.unwrap();
  assert_eq!(all, 2);

  let query = MeetingQuery {
    team: Some("Falcons".into()),
    ..Default::default()
  };
  assert_eq!(s.count_meetings(&query).await.unwrap(), 1);
}

// ─── Chat sessions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_session_roundtrips_context() {
  let s = store().await;

  let context = json!({
    "turn": 1,
    "history": [{"role": "user", "text": "hello"}],
    "flags": {"resumed": false},
  });

  let created = s
    .create_session("sess-abc", Some(context.clone()))
    .await
    .unwrap();
  assert_eq!(created.session_id, "sess-abc");

  let fetched = s.get_session("sess-abc").await.unwrap();
  assert_eq!(fetched.id, created.id);
  assert_eq!(fetched.context, Some(context));
}

#[tokio::test]
async fn create_session_without_context() {
  let s = store().await;

  s.create_session("bare", None).await.unwrap();
  let fetched = s.get_session("bare").await.unwrap();
  assert_eq!(fetched.context, None);
}

#[tokio::test]
async fn duplicate_create_fails_and_preserves_original() {
  let s = store().await;

  s.create_session("sess-123", Some(json!({"turn": 1})))
    .await
    .unwrap();

  let err = s
    .create_session("sess-123", Some(json!({"turn": 2})))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateSessionId(ref id) if id == "sess-123"));

  // The losing insert must not have overwritten anything.
  let fetched = s.get_session("sess-123").await.unwrap();
  assert_eq!(fetched.context, Some(json!({"turn": 1})));
}

#[tokio::test]
async fn create_session_rejects_empty_id() {
  let s = store().await;

  let err = s.create_session("", None).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(palaver_core::Error::ConstraintViolation(_))
  ));
}

#[tokio::test]
async fn get_session_missing_errors() {
  let s = store().await;

  let err = s.get_session("never-created").await.unwrap_err();
  assert!(matches!(err, Error::SessionNotFound(ref id) if id == "never-created"));
}

#[tokio::test]
async fn update_context_replaces_document() {
  let s = store().await;

  s.create_session("sess-9", Some(json!({"turn": 1, "stale": true})))
    .await
    .unwrap();

  let updated = s
    .update_context("sess-9", json!({"turn": 2}))
    .await
    .unwrap();
  // Whole-document replace: nothing from the old context survives.
  assert_eq!(updated.context, Some(json!({"turn": 2})));

  let fetched = s.get_session("sess-9").await.unwrap();
  assert_eq!(fetched.context, Some(json!({"turn": 2})));
}

#[tokio::test]
async fn update_context_missing_session_errors() {
  let s = store().await;

  let err = s
    .update_context("ghost", json!({"turn": 1}))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SessionNotFound(_)));
}

#[tokio::test]
async fn concurrent_creates_resolve_to_one_winner() {
  let s = store().await;

  let a = {
    let s = s.clone();
    tokio::spawn(async move { s.create_session("racy", None).await })
  };
  let b = {
    let s = s.clone();
    tokio::spawn(async move { s.create_session("racy", None).await })
  };

  let results = [a.await.unwrap(), b.await.unwrap()];

  let successes = results.iter().filter(|r| r.is_ok()).count();
  let duplicates = results
    .iter()
    .filter(|r| matches!(r, Err(Error::DuplicateSessionId(_))))
    .count();
  assert_eq!(successes, 1);
  assert_eq!(duplicates, 1);
}

// ─── Conversation turns ──────────────────────────────────────────────────────

#[tokio::test]
async fn log_turns_and_fetch_in_order() {
  let s = store().await;

  let mut first = NewTurn::new(
    "what's the weather?",
    "Sunny, 22C.",
    AgentKind::Weather,
  );
  first.conversation_id = Some("conv-1".into());
  s.log_turn(first).await.unwrap();

  let mut second = NewTurn::new(
    "schedule a meeting tomorrow",
    "Booked for 2024-05-02.",
    AgentKind::Scheduling,
  );
  second.conversation_id = Some("conv-1".into());
  s.log_turn(second).await.unwrap();

  let mut other = NewTurn::new("hi", "Hello!", AgentKind::General);
  other.conversation_id = Some("conv-2".into());
  s.log_turn(other).await.unwrap();

  let turns = s.turns_for("conv-1").await.unwrap();
  assert_eq!(turns.len(), 2);
  assert_eq!(turns[0].user_message, "what's the weather?");
  assert_eq!(turns[1].agent_kind, AgentKind::Scheduling);
}

#[tokio::test]
async fn turns_for_unknown_conversation_is_empty() {
  let s = store().await;
  let turns = s.turns_for("conv-404").await.unwrap();
  assert!(turns.is_empty());
}

#[tokio::test]
async fn turn_roundtrips_kind_confidence_extra_data() {
  let s = store().await;

  let mut input = NewTurn::new(
    "how many meetings this week?",
    "Three meetings are scheduled.",
    AgentKind::Database,
  );
  input.conversation_id = Some("conv-7".into());
  input.confidence = 85;
  input.extra_data = Some(json!({"matched": 3}));
  s.log_turn(input).await.unwrap();

  let turns = s.turns_for("conv-7").await.unwrap();
  assert_eq!(turns.len(), 1);
  assert_eq!(turns[0].agent_kind, AgentKind::Database);
  assert_eq!(turns[0].confidence, 85);
  assert_eq!(turns[0].extra_data, Some(json!({"matched": 3})));
}

#[tokio::test]
async fn log_turn_rejects_confidence_over_100() {
  let s = store().await;

  let mut input = NewTurn::new("hi", "Hello!", AgentKind::General);
  input.confidence = 101;
  let err = s.log_turn(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(palaver_core::Error::ConstraintViolation(_))
  ));
}

// ─── Migrations & persistence ────────────────────────────────────────────────

#[tokio::test]
async fn schema_version_is_latest_after_open() {
  let s = store().await;
  let version = s.schema_version().await.unwrap();
  assert_eq!(version, migrations::LATEST_VERSION);
}

#[tokio::test]
async fn reopen_preserves_rows() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("palaver.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.insert_meeting(falcons_meeting()).await.unwrap();
    s.create_session("sess-keep", Some(json!({"turn": 4})))
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.schema_version().await.unwrap(), migrations::LATEST_VERSION);

  let found = s.meetings_on(date("2024-05-01")).await.unwrap();
  assert_eq!(found.len(), 1);

  let session = s.get_session("sess-keep").await.unwrap();
  assert_eq!(session.context, Some(json!({"turn": 4})));
}
