//! The game window and the round phase derived from it.
//!
//! Phase is never stored; it is classified from `(start, end, now)` on demand.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The closed interval during which tagging is allowed.
/// Only built through [`GameWindow::new`], so `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameWindow {
  start: DateTime<Utc>,
  end:   DateTime<Utc>,
}

impl GameWindow {
  /// Fails with [`Error::InvalidWindow`] when `start > end`.
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidWindow);
    }
    Ok(Self { start, end })
  }

  pub fn start(&self) -> DateTime<Utc> { self.start }

  pub fn end(&self) -> DateTime<Utc> { self.end }

  pub fn phase(&self, now: DateTime<Utc>) -> GamePhase {
    GamePhase::classify(self, now)
  }

  /// Pin `now` into `[start, end]`.
  pub fn clamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now.clamp(self.start, self.end)
  }
}

/// Where `now` falls relative to a [`GameWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
  /// Before the start; display only.
  Pending,
  /// Within the window, bounds inclusive. The only phase that accepts tags.
  Active,
  /// After the end; display only.
  Ended,
}

impl GamePhase {
  pub fn classify(window: &GameWindow, now: DateTime<Utc>) -> Self {
    if now < window.start {
      Self::Pending
    } else if now > window.end {
      Self::Ended
    } else {
      Self::Active
    }
  }

  pub fn accepts_tags(self) -> bool { matches!(self, Self::Active) }
}

impl fmt::Display for GamePhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Pending => "pending",
      Self::Active => "active",
      Self::Ended => "ended",
    })
  }
}
