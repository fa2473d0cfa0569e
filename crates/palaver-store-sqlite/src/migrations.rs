//! Versioned schema migrations for the Palaver SQLite store.
//!
//! Migrations are an explicit, ordered list. Each entry runs in its own
//! transaction and records its version in `PRAGMA user_version`, so a store
//! file is upgraded exactly once per version and re-opening an up-to-date
//! file applies nothing.

use rusqlite::Connection;
use tracing::info;

/// A single schema step. The DDL itself is not idempotent; version gating is
/// what makes re-application safe.
pub struct Migration {
  pub version: i64,
  pub sql:     &'static str,
}

/// Meeting records and chat sessions, plus their three indexes.
const V1_BASE_SCHEMA: &str = "
CREATE TABLE meetings (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    date               TEXT NOT NULL,    -- ISO 8601 calendar date
    team               TEXT NOT NULL,
    description        TEXT,
    location           TEXT,
    weather_conditions TEXT,
    created_at         TEXT NOT NULL     -- RFC 3339 UTC; store-assigned
);

CREATE INDEX meetings_date_idx ON meetings(date);
CREATE INDEX meetings_team_idx ON meetings(team);

CREATE TABLE chat_sessions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    context    TEXT,                     -- JSON document or NULL
    created_at TEXT NOT NULL
);

-- Lookup accelerator and uniqueness enforcement in one structure.
CREATE UNIQUE INDEX chat_sessions_session_idx ON chat_sessions(session_id);
";

/// Conversation turn log. `conversation_id` is a free-form grouping key, not
/// a foreign key into `chat_sessions`.
const V2_CONVERSATIONS: &str = "
CREATE TABLE conversations (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id TEXT,
    user_message    TEXT NOT NULL,
    agent_response  TEXT NOT NULL,
    agent_type      TEXT NOT NULL,       -- AgentKind discriminant
    confidence      INTEGER NOT NULL DEFAULT 0,
    extra_data      TEXT,
    timestamp       TEXT NOT NULL
);

CREATE INDEX conversations_conversation_idx ON conversations(conversation_id);
";

/// All migrations, in application order. Append-only: released versions are
/// never edited.
pub const MIGRATIONS: &[Migration] = &[
  Migration { version: 1, sql: V1_BASE_SCHEMA },
  Migration { version: 2, sql: V2_CONVERSATIONS },
];

/// The version a fully migrated store reports.
pub const LATEST_VERSION: i64 = MIGRATIONS[MIGRATIONS.len() - 1].version;

/// Connection-level pragmas, applied on every open.
const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Apply every migration newer than the file's recorded version.
pub fn apply_pending(conn: &mut Connection) -> rusqlite::Result<()> {
  conn.execute_batch(PRAGMAS)?;

  let current = current_version(conn)?;
  for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
    let tx = conn.transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()?;
    info!(version = migration.version, "applied schema migration");
  }
  Ok(())
}

/// The schema version recorded in the file.
pub fn current_version(conn: &Connection) -> rusqlite::Result<i64> {
  conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}
