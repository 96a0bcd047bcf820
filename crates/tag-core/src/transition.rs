//! Pure state transitions of the tag state machine.
//!
//! Stores call these inside their transaction on freshly-read records, then
//! write the results to both the profile and the roster copy.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  player::{PlayerRecord, PlayerState, TagStatus},
  timing::elapsed_ms,
};

/// Hand "it" from `tagger` to `target` at `now`.
///
/// The tagger's open stint is closed into `time_it_ms`; the target becomes
/// "it" from `now` and their catch count goes up by one.
pub fn tag(
  tagger: &PlayerRecord,
  target: &PlayerRecord,
  now: DateTime<Utc>,
) -> Result<(PlayerRecord, PlayerRecord)> {
  if tagger.user_id == target.user_id {
    return Err(Error::SelfTag);
  }
  if !tagger.state.status.is_it() {
    return Err(Error::NotIt(tagger.user_id));
  }

  let stint = tagger
    .state
    .time_caught
    .map(|caught| elapsed_ms(caught, now))
    .unwrap_or(0);

  let new_tagger = PlayerRecord {
    state: PlayerState {
      status: TagStatus::NotIt,
      time_it_ms: tagger.state.time_it_ms.saturating_add(stint),
      ..tagger.state.clone()
    },
    ..tagger.clone()
  };

  let new_target = PlayerRecord {
    state: PlayerState {
      status: TagStatus::It,
      time_caught: Some(now),
      times_caught: target.state.times_caught.saturating_add(1),
      ..target.state.clone()
    },
    ..target.clone()
  };

  Ok((new_tagger, new_target))
}

/// Reset a roster for a new round: `it_player` is "it" from `start`, everyone
/// else is back to the joined defaults.
pub fn start_round(
  roster: &[PlayerRecord],
  it_player: uuid::Uuid,
  start: DateTime<Utc>,
) -> Vec<PlayerRecord> {
  roster
    .iter()
    .map(|p| PlayerRecord {
      state: if p.user_id == it_player {
        PlayerState::it_from(start)
      } else {
        PlayerState::default()
      },
      ..p.clone()
    })
    .collect()
}
