//! [`SqliteStore`] — the SQLite implementation of the Palaver store traits.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use palaver_core::{
  meeting::{Meeting, NewMeeting},
  session::ChatSession,
  store::{MeetingQuery, MeetingStore, SessionStore, TranscriptStore},
  transcript::{NewTurn, Turn},
};

use crate::{
  Error, Result,
  encode::{
    RawMeeting, RawSession, RawTurn, encode_agent_kind, encode_date,
    encode_document, encode_dt,
  },
  error::is_unique_violation,
  migrations,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Palaver stores backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements run on the connection's dedicated thread, so conflicting
/// writes are serialized by construction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and apply pending migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        migrations::apply_pending(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The schema version the underlying file is migrated to.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| Ok(migrations::current_version(conn)?))
      .await?;
    Ok(version)
  }
}

// ─── MeetingStore impl ───────────────────────────────────────────────────────

impl MeetingStore for SqliteStore {
  type Error = Error;

  async fn insert_meeting(&self, input: NewMeeting) -> Result<Meeting> {
    input.validate()?;

    let created_at = Utc::now();

    let date_str       = encode_date(input.date);
    let created_at_str = encode_dt(created_at);
    let team           = input.team.clone();
    let description    = input.description.clone();
    let location       = input.location.clone();
    let weather        = input.weather_conditions.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO meetings
             (date, team, description, location, weather_conditions, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            date_str,
            team,
            description,
            location,
            weather,
            created_at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(id, "inserted meeting");

    Ok(Meeting {
      id,
      date: input.date,
      team: input.team,
      description: input.description,
      location: input.location,
      weather_conditions: input.weather_conditions,
      created_at,
    })
  }

  async fn meetings_on(&self, date: NaiveDate) -> Result<Vec<Meeting>> {
    let date_str = encode_date(date);

    let raws: Vec<RawMeeting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, date, team, description, location, weather_conditions,
                  created_at
           FROM meetings WHERE date = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], meeting_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMeeting::into_meeting).collect()
  }

  async fn meetings_for_team(&self, team: &str) -> Result<Vec<Meeting>> {
    let team_owned = team.to_owned();

    let raws: Vec<RawMeeting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, date, team, description, location, weather_conditions,
                  created_at
           FROM meetings WHERE team = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![team_owned], meeting_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMeeting::into_meeting).collect()
  }

  async fn find_meetings(&self, query: &MeetingQuery) -> Result<Vec<Meeting>> {
    let after            = query.after.map(encode_date);
    let before           = query.before.map(encode_date);
    let team             = query.team.clone();
    let location_pattern = query.location.as_deref().map(|l| format!("%{l}%"));
    // LIMIT -1 is SQLite for "no limit".
    let limit  = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawMeeting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, date, team, description, location, weather_conditions,
                  created_at
           FROM meetings
           WHERE (?1 IS NULL OR date >= ?1)
             AND (?2 IS NULL OR date <= ?2)
             AND (?3 IS NULL OR team = ?3)
             AND (?4 IS NULL OR location LIKE ?4)
           ORDER BY date ASC
           LIMIT ?5 OFFSET ?6",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              after,
              before,
              team,
              location_pattern,
              limit,
              offset,
            ],
            meeting_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMeeting::into_meeting).collect()
  }

  async fn count_meetings(&self, query: &MeetingQuery) -> Result<u64> {
    let after            = query.after.map(encode_date);
    let before           = query.before.map(encode_date);
    let team             = query.team.clone();
    let location_pattern = query.location.as_deref().map(|l| format!("%{l}%"));

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM meetings
           WHERE (?1 IS NULL OR date >= ?1)
             AND (?2 IS NULL OR date <= ?2)
             AND (?3 IS NULL OR team = ?3)
             AND (?4 IS NULL OR location LIKE ?4)",
          rusqlite::params![after, before, team, location_pattern],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for SqliteStore {
  type Error = Error;

  async fn create_session(
    &self,
    session_id: &str,
    context: Option<serde_json::Value>,
  ) -> Result<ChatSession> {
    if session_id.is_empty() {
      return Err(
        palaver_core::Error::ConstraintViolation(
          "chat_sessions.session_id must not be empty".into(),
        )
        .into(),
      );
    }

    let created_at = Utc::now();

    let context_str    = context.as_ref().map(encode_document).transpose()?;
    let id_owned       = session_id.to_owned();
    let created_at_str = encode_dt(created_at);

    let insert = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO chat_sessions (session_id, context, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_owned, context_str, created_at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await;

    let id = match insert {
      Ok(id) => id,
      Err(ref e) if is_unique_violation(e) => {
        return Err(Error::DuplicateSessionId(session_id.to_owned()));
      }
      Err(e) => return Err(e.into()),
    };

    debug!(session_id, "created chat session");

    Ok(ChatSession {
      id,
      session_id: session_id.to_owned(),
      context,
      created_at,
    })
  }

  async fn get_session(&self, session_id: &str) -> Result<ChatSession> {
    let id_owned = session_id.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, session_id, context, created_at
               FROM chat_sessions WHERE session_id = ?1",
              rusqlite::params![id_owned],
              session_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => raw.into_session(),
      None => Err(Error::SessionNotFound(session_id.to_owned())),
    }
  }

  async fn update_context(
    &self,
    session_id: &str,
    context: serde_json::Value,
  ) -> Result<ChatSession> {
    let context_str = encode_document(&context)?;
    let id_owned = session_id.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE chat_sessions SET context = ?2 WHERE session_id = ?1",
          rusqlite::params![id_owned, context_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              "SELECT id, session_id, context, created_at
               FROM chat_sessions WHERE session_id = ?1",
              rusqlite::params![id_owned],
              session_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => raw.into_session(),
      None => Err(Error::SessionNotFound(session_id.to_owned())),
    }
  }
}

// ─── TranscriptStore impl ────────────────────────────────────────────────────

impl TranscriptStore for SqliteStore {
  type Error = Error;

  async fn log_turn(&self, input: NewTurn) -> Result<Turn> {
    if input.confidence > 100 {
      return Err(
        palaver_core::Error::ConstraintViolation(
          "conversations.confidence exceeds 100".into(),
        )
        .into(),
      );
    }

    let timestamp = Utc::now();

    let timestamp_str   = encode_dt(timestamp);
    let agent_type      = encode_agent_kind(input.agent_kind).to_owned();
    let extra_str       = input.extra_data.as_ref().map(encode_document).transpose()?;
    let conversation_id = input.conversation_id.clone();
    let user_message    = input.user_message.clone();
    let agent_response  = input.agent_response.clone();
    let confidence      = i64::from(input.confidence);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO conversations
             (conversation_id, user_message, agent_response, agent_type,
              confidence, extra_data, timestamp)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            conversation_id,
            user_message,
            agent_response,
            agent_type,
            confidence,
            extra_str,
            timestamp_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Turn {
      id,
      conversation_id: input.conversation_id,
      user_message: input.user_message,
      agent_response: input.agent_response,
      agent_kind: input.agent_kind,
      confidence: input.confidence,
      extra_data: input.extra_data,
      timestamp,
    })
  }

  async fn turns_for(&self, conversation_id: &str) -> Result<Vec<Turn>> {
    let id_owned = conversation_id.to_owned();

    let raws: Vec<RawTurn> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, conversation_id, user_message, agent_response,
                  agent_type, confidence, extra_data, timestamp
           FROM conversations
           WHERE conversation_id = ?1
           ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_owned], turn_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTurn::into_turn).collect()
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn meeting_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMeeting> {
  Ok(RawMeeting {
    id:                 row.get(0)?,
    date:               row.get(1)?,
    team:               row.get(2)?,
    description:        row.get(3)?,
    location:           row.get(4)?,
    weather_conditions: row.get(5)?,
    created_at:         row.get(6)?,
  })
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSession> {
  Ok(RawSession {
    id:         row.get(0)?,
    session_id: row.get(1)?,
    context:    row.get(2)?,
    created_at: row.get(3)?,
  })
}

fn turn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTurn> {
  Ok(RawTurn {
    id:              row.get(0)?,
    conversation_id: row.get(1)?,
    user_message:    row.get(2)?,
    agent_response:  row.get(3)?,
    agent_type:      row.get(4)?,
    confidence:      row.get(5)?,
    extra_data:      row.get(6)?,
    timestamp:       row.get(7)?,
  })
}
