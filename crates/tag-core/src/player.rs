//! Player state: the one aggregate shared by a user's profile and their
//! roster entry in a game.
//!
//! Both physical copies are always written from the same [`PlayerState`] by
//! the store, inside a single transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a player currently holds the "it" role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TagStatus {
  #[serde(rename = "it")]
  It,
  #[default]
  #[serde(rename = "not it")]
  NotIt,
}

impl TagStatus {
  pub fn is_it(self) -> bool { matches!(self, Self::It) }
}

/// Tag bookkeeping for one player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerState {
  pub status:       TagStatus,
  /// Accumulated "it" time in milliseconds, excluding the current stint.
  pub time_it_ms:   u64,
  /// When the player most recently became "it".
  pub time_caught:  Option<DateTime<Utc>>,
  /// How many times the player has been tagged.
  pub times_caught: u32,
}

impl PlayerState {
  /// State of a player who is "it" from `since`, with zeroed counters.
  pub fn it_from(since: DateTime<Utc>) -> Self {
    Self {
      status:       TagStatus::It,
      time_it_ms:   0,
      time_caught:  Some(since),
      times_caught: 0,
    }
  }
}

/// A player's entry in a game's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
  pub user_id: Uuid,
  pub name:    String,
  #[serde(flatten)]
  pub state:   PlayerState,
}

impl PlayerRecord {
  /// A freshly-joined player: "not it", all counters zeroed.
  pub fn joined(user_id: Uuid, name: impl Into<String>) -> Self {
    Self { user_id, name: name.into(), state: PlayerState::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_serialises_as_display_strings() {
    assert_eq!(serde_json::to_string(&TagStatus::It).unwrap(), "\"it\"");
    assert_eq!(
      serde_json::to_string(&TagStatus::NotIt).unwrap(),
      "\"not it\""
    );
  }

  #[test]
  fn record_flattens_state() {
    let record = PlayerRecord::joined(Uuid::nil(), "Ada");
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["status"], "not it");
    assert_eq!(value["time_it_ms"], 0);
    assert_eq!(value["times_caught"], 0);
    assert!(value["time_caught"].is_null());
  }
}
