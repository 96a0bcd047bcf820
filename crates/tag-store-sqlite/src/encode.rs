//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanoseconds, `Z`)
//! so that text order is time order. UUIDs are stored as hyphenated lowercase
//! strings, PINs as their six-digit form.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use tag_core::{
  game::Game,
  pin::Pin,
  player::{PlayerRecord, PlayerState, TagStatus},
  user::UserProfile,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_pin(s: &str) -> Result<Pin> { Ok(s.parse::<Pin>()?) }

pub fn encode_status(s: TagStatus) -> &'static str {
  match s {
    TagStatus::It => "it",
    TagStatus::NotIt => "not it",
  }
}

pub fn decode_status(s: &str) -> Result<TagStatus> {
  match s {
    "it" => Ok(TagStatus::It),
    "not it" => Ok(TagStatus::NotIt),
    other => Err(tag_core::Error::UnknownStatus(other.to_owned()).into()),
  }
}

fn decode_count<T: TryFrom<i64>>(column: &'static str, v: i64) -> Result<T> {
  T::try_from(v).map_err(|_| Error::Corrupt { column, value: v.to_string() })
}

pub fn encode_count(v: u64) -> i64 { i64::try_from(v).unwrap_or(i64::MAX) }

// ─── Player state ────────────────────────────────────────────────────────────

/// The four tag-state columns shared by `users` and `players`.
pub struct RawState {
  pub status:       String,
  pub time_it_ms:   i64,
  pub time_caught:  Option<String>,
  pub times_caught: i64,
}

impl RawState {
  pub fn encode(state: &PlayerState) -> Self {
    Self {
      status:       encode_status(state.status).to_owned(),
      time_it_ms:   encode_count(state.time_it_ms),
      time_caught:  state.time_caught.map(encode_dt),
      times_caught: i64::from(state.times_caught),
    }
  }

  fn into_state(self) -> Result<PlayerState> {
    Ok(PlayerState {
      status:       decode_status(&self.status)?,
      time_it_ms:   decode_count("time_it_ms", self.time_it_ms)?,
      time_caught:  self.time_caught.as_deref().map(decode_dt).transpose()?,
      times_caught: decode_count("times_caught", self.times_caught)?,
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, name, email, created_at, in_game, \
                                status, time_it_ms, time_caught, times_caught, \
                                game_pin";

/// Raw strings read directly from a `users` row (see [`USER_COLUMNS`]).
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub created_at: String,
  pub in_game:    bool,
  pub state:      RawState,
  pub game_pin:   Option<String>,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      created_at: row.get(3)?,
      in_game:    row.get(4)?,
      state:      RawState {
        status:       row.get(5)?,
        time_it_ms:   row.get(6)?,
        time_caught:  row.get(7)?,
        times_caught: row.get(8)?,
      },
      game_pin:   row.get(9)?,
    })
  }

  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
      in_game:    self.in_game,
      state:      self.state.into_state()?,
      game_pin:   self.game_pin.as_deref().map(decode_pin).transpose()?,
    })
  }
}

pub const GAME_COLUMNS: &str =
  "pin, created_at, is_active, current_it, start_date, end_date, version";

/// Raw strings read directly from a `games` row (see [`GAME_COLUMNS`]).
pub struct RawGame {
  pub pin:        String,
  pub created_at: String,
  pub is_active:  bool,
  pub current_it: Option<String>,
  pub start_date: String,
  pub end_date:   String,
  pub version:    i64,
}

impl RawGame {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      pin:        row.get(0)?,
      created_at: row.get(1)?,
      is_active:  row.get(2)?,
      current_it: row.get(3)?,
      start_date: row.get(4)?,
      end_date:   row.get(5)?,
      version:    row.get(6)?,
    })
  }

  pub fn into_game(self) -> Result<Game> {
    Ok(Game {
      pin:        decode_pin(&self.pin)?,
      created_at: decode_dt(&self.created_at)?,
      is_active:  self.is_active,
      current_it: self.current_it.as_deref().map(decode_uuid).transpose()?,
      start_date: decode_dt(&self.start_date)?,
      end_date:   decode_dt(&self.end_date)?,
      version:    decode_count("version", self.version)?,
    })
  }
}

pub const PLAYER_COLUMNS: &str =
  "user_id, name, status, time_it_ms, time_caught, times_caught";

/// Raw strings read directly from a `players` row (see [`PLAYER_COLUMNS`]).
pub struct RawPlayer {
  pub user_id: String,
  pub name:    String,
  pub state:   RawState,
}

impl RawPlayer {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id: row.get(0)?,
      name:    row.get(1)?,
      state:   RawState {
        status:       row.get(2)?,
        time_it_ms:   row.get(3)?,
        time_caught:  row.get(4)?,
        times_caught: row.get(5)?,
      },
    })
  }

  pub fn into_record(self) -> Result<PlayerRecord> {
    Ok(PlayerRecord {
      user_id: decode_uuid(&self.user_id)?,
      name:    self.name,
      state:   self.state.into_state()?,
    })
  }
}
