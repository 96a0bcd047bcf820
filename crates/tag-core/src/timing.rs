//! "It" time accounting.
//!
//! Only closed stints are stored (`time_it_ms`). The open stint of the
//! current "it" player is added on read from `time_caught`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::PlayerState;

const MS_PER_DAY: u64 = 86_400_000;
const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Milliseconds from `since` to `now`, or zero if `now` is earlier.
pub fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
  u64::try_from((now - since).num_milliseconds()).unwrap_or(0)
}

/// Total "it" time for `state` as of `now`, including any open stint.
pub fn effective_it_ms(state: &PlayerState, now: DateTime<Utc>) -> u64 {
  match (state.status.is_it(), state.time_caught) {
    (true, Some(caught)) => {
      state.time_it_ms.saturating_add(elapsed_ms(caught, now))
    }
    _ => state.time_it_ms,
  }
}

/// A millisecond total broken down into whole days, hours, minutes, seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItTime {
  pub days:    u64,
  pub hours:   u64,
  pub minutes: u64,
  pub seconds: u64,
}

impl ItTime {
  pub fn from_millis(total_ms: u64) -> Self {
    let days = total_ms / MS_PER_DAY;
    let rest = total_ms % MS_PER_DAY;
    let hours = rest / MS_PER_HOUR;
    let rest = rest % MS_PER_HOUR;
    let minutes = rest / MS_PER_MINUTE;
    let rest = rest % MS_PER_MINUTE;
    let seconds = rest / MS_PER_SECOND;
    Self { days, hours, minutes, seconds }
  }

  pub fn total_seconds(&self) -> u64 {
    self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
  }
}

impl fmt::Display for ItTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}d {}h {}m {}s",
      self.days, self.hours, self.minutes, self.seconds
    )
  }
}
