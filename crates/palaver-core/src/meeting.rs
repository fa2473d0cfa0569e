//! Meeting records — append-only descriptions of physical meetings.
//!
//! A meeting is never updated or deleted once stored. The store assigns the
//! `id` and stamps `created_at`; neither is accepted from callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum length of the `team` field.
pub const TEAM_MAX_LEN: usize = 100;
/// Maximum length of the `location` field.
pub const LOCATION_MAX_LEN: usize = 100;
/// Maximum length of the `weather_conditions` field.
pub const WEATHER_MAX_LEN: usize = 200;

/// A stored meeting record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
  /// Store-assigned, monotonically increasing; never reused.
  pub id:                 i64,
  pub date:               NaiveDate,
  pub team:               String,
  pub description:        Option<String>,
  pub location:           Option<String>,
  pub weather_conditions: Option<String>,
  /// Stamped by the store at insertion; never changes afterwards.
  pub created_at:         DateTime<Utc>,
}

/// Input to [`crate::store::MeetingStore::insert_meeting`].
/// `id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewMeeting {
  pub date:               NaiveDate,
  pub team:               String,
  pub description:        Option<String>,
  pub location:           Option<String>,
  pub weather_conditions: Option<String>,
}

impl NewMeeting {
  /// Convenience constructor with all optional fields unset.
  pub fn new(date: NaiveDate, team: impl Into<String>) -> Self {
    Self {
      date,
      team: team.into(),
      description: None,
      location: None,
      weather_conditions: None,
    }
  }

  /// Check the field-level constraints the schema promises.
  pub fn validate(&self) -> Result<()> {
    if self.team.trim().is_empty() {
      return Err(Error::ConstraintViolation(
        "meetings.team must not be empty".into(),
      ));
    }
    if self.team.chars().count() > TEAM_MAX_LEN {
      return Err(Error::ConstraintViolation(format!(
        "meetings.team exceeds {TEAM_MAX_LEN} characters"
      )));
    }
    if let Some(location) = &self.location {
      if location.chars().count() > LOCATION_MAX_LEN {
        return Err(Error::ConstraintViolation(format!(
          "meetings.location exceeds {LOCATION_MAX_LEN} characters"
        )));
      }
    }
    if let Some(weather) = &self.weather_conditions {
      if weather.chars().count() > WEATHER_MAX_LEN {
        return Err(Error::ConstraintViolation(format!(
          "meetings.weather_conditions exceeds {WEATHER_MAX_LEN} characters"
        )));
      }
    }
    Ok(())
  }
}
