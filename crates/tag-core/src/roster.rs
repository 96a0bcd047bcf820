//! The caller-side roster view: a snapshot of a game's players with "it"
//! time resolved, kept current by applying tag outcomes locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  game::Game,
  pin::Pin,
  player::{PlayerRecord, TagStatus},
  store::TagOutcome,
  timing::{ItTime, effective_it_ms},
  window::{GamePhase, GameWindow},
};

/// One player as seen in a [`RosterView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
  #[serde(flatten)]
  pub record:          PlayerRecord,
  pub effective_it_ms: u64,
  pub time_it:         ItTime,
  pub is_me:           bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterView {
  pub pin:       Pin,
  pub me:        Uuid,
  /// The viewer's status; `None` if the viewer is not on the roster.
  pub my_status: Option<TagStatus>,
  /// `None` until the round has been started.
  pub phase:     Option<GamePhase>,
  pub version:   u64,
  pub as_of:     DateTime<Utc>,
  pub players:   Vec<RosterEntry>,
  #[serde(skip)]
  window:        Option<GameWindow>,
}

impl RosterView {
  pub fn new(
    game: &Game,
    players: Vec<PlayerRecord>,
    me: Uuid,
    now: DateTime<Utc>,
  ) -> Self {
    let window = if game.is_active { game.window().ok() } else { None };
    let mut view = Self {
      pin: game.pin,
      me,
      my_status: None,
      phase: window.map(|w| w.phase(now)),
      version: game.version,
      as_of: now,
      players: Vec::with_capacity(players.len()),
      window,
    };
    view.players = players.into_iter().map(|p| view.entry(p)).collect();
    view.my_status = view.status_of(me);
    view
  }

  pub fn status_of(&self, user_id: Uuid) -> Option<TagStatus> {
    self
      .players
      .iter()
      .find(|e| e.record.user_id == user_id)
      .map(|e| e.record.state.status)
  }

  /// The player currently "it", if any.
  pub fn it(&self) -> Option<&RosterEntry> {
    self.players.iter().find(|e| e.record.state.status.is_it())
  }

  /// Fold a committed tag into the view without re-reading the store.
  pub fn apply_tag(&mut self, outcome: &TagOutcome) {
    self.as_of = self.as_of.max(outcome.at);
    self.version = outcome.game.version;
    if let Some(window) = self.window {
      self.phase = Some(window.phase(self.as_of));
    }

    let mut records: Vec<PlayerRecord> =
      std::mem::take(&mut self.players).into_iter().map(|e| e.record).collect();
    for updated in [&outcome.tagger, &outcome.target] {
      match records.iter_mut().find(|r| r.user_id == updated.user_id) {
        Some(slot) => *slot = updated.clone(),
        None => records.push(updated.clone()),
      }
    }

    // Everyone is re-resolved: `as_of` may have moved.
    self.players = records.into_iter().map(|r| self.entry(r)).collect();
    self.my_status = self.status_of(self.me);
  }

  fn entry(&self, record: PlayerRecord) -> RosterEntry {
    let at = match self.window {
      Some(w) => w.clamp(self.as_of),
      None => self.as_of,
    };
    let effective = effective_it_ms(&record.state, at);
    RosterEntry {
      is_me: record.user_id == self.me,
      effective_it_ms: effective,
      time_it: ItTime::from_millis(effective),
      record,
    }
  }
}
