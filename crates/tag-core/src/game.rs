//! Game documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  pin::Pin,
  window::{GamePhase, GameWindow},
};

/// A game, keyed by its PIN. Players live in a separate roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
  pub pin:        Pin,
  pub created_at: DateTime<Utc>,
  pub is_active:  bool,
  /// The player currently "it"; `None` before the round starts or after the
  /// it-player leaves.
  pub current_it: Option<Uuid>,
  pub start_date: DateTime<Utc>,
  pub end_date:   DateTime<Utc>,
  /// Bumped by every mutation of the game or its roster.
  pub version:    u64,
}

impl Game {
  /// A freshly created, not-yet-started game. The window collapses onto the
  /// creation instant until a round is started.
  pub fn new(pin: Pin, now: DateTime<Utc>) -> Self {
    Self {
      pin,
      created_at: now,
      is_active: false,
      current_it: None,
      start_date: now,
      end_date: now,
      version: 0,
    }
  }

  pub fn window(&self) -> Result<GameWindow> {
    GameWindow::new(self.start_date, self.end_date)
  }

  /// `None` until the round has been started.
  pub fn phase(&self, now: DateTime<Utc>) -> Option<GamePhase> {
    if !self.is_active {
      return None;
    }
    self.window().ok().map(|w| w.phase(now))
  }
}
