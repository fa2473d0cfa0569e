//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as ISO
//! `YYYY-MM-DD`, so lexicographic index order equals date order. Context
//! documents are stored as compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use palaver_core::{
  meeting::Meeting,
  session::ChatSession,
  transcript::{AgentKind, Turn},
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Opaque documents ────────────────────────────────────────────────────────

pub fn encode_document(value: &serde_json::Value) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_document(s: &str) -> Result<serde_json::Value> {
  Ok(serde_json::from_str(s)?)
}

// ─── AgentKind ───────────────────────────────────────────────────────────────

pub fn encode_agent_kind(k: AgentKind) -> &'static str {
  match k {
    AgentKind::Weather => "weather",
    AgentKind::Document => "document",
    AgentKind::Scheduling => "scheduling",
    AgentKind::Database => "database",
    AgentKind::General => "general",
  }
}

pub fn decode_agent_kind(s: &str) -> Result<AgentKind> {
  match s {
    "weather" => Ok(AgentKind::Weather),
    "document" => Ok(AgentKind::Document),
    "scheduling" => Ok(AgentKind::Scheduling),
    "database" => Ok(AgentKind::Database),
    "general" => Ok(AgentKind::General),
    other => {
      Err(palaver_core::Error::UnknownAgentKind(other.to_owned()).into())
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `meetings` row.
pub struct RawMeeting {
  pub id:                 i64,
  pub date:               String,
  pub team:               String,
  pub description:        Option<String>,
  pub location:           Option<String>,
  pub weather_conditions: Option<String>,
  pub created_at:         String,
}

impl RawMeeting {
  pub fn into_meeting(self) -> Result<Meeting> {
    Ok(Meeting {
      id:                 self.id,
      date:               decode_date(&self.date)?,
      team:               self.team,
      description:        self.description,
      location:           self.location,
      weather_conditions: self.weather_conditions,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `chat_sessions` row.
pub struct RawSession {
  pub id:         i64,
  pub session_id: String,
  pub context:    Option<String>,
  pub created_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<ChatSession> {
    let context = self.context.as_deref().map(decode_document).transpose()?;
    Ok(ChatSession {
      id: self.id,
      session_id: self.session_id,
      context,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `conversations` row.
pub struct RawTurn {
  pub id:              i64,
  pub conversation_id: Option<String>,
  pub user_message:    String,
  pub agent_response:  String,
  pub agent_type:      String,
  pub confidence:      i64,
  pub extra_data:      Option<String>,
  pub timestamp:       String,
}

impl RawTurn {
  pub fn into_turn(self) -> Result<Turn> {
    let extra_data =
      self.extra_data.as_deref().map(decode_document).transpose()?;
    Ok(Turn {
      id:              self.id,
      conversation_id: self.conversation_id,
      user_message:    self.user_message,
      agent_response:  self.agent_response,
      agent_kind:      decode_agent_kind(&self.agent_type)?,
      confidence:      self.confidence.clamp(0, 100) as u8,
      extra_data,
      timestamp:       decode_dt(&self.timestamp)?,
    })
  }
}
