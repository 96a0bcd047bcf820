//! The tag-state engine: starting rounds, tagging, and resolving "it" time.
//!
//! Callers gate tags on [`GamePhase::Active`] to give early feedback; the
//! store checks the phase again at commit time with the same instant the tag
//! is applied at.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error,
  clock::{Clock, SystemClock},
  game::Game,
  pin::Pin,
  player::PlayerRecord,
  roster::RosterView,
  store::{GameStore, TagOutcome},
  window::{GamePhase, GameWindow},
};

pub struct TagEngine<S, C = SystemClock> {
  store: Arc<S>,
  clock: C,
}

impl<S: GameStore> TagEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self::with_clock(store, SystemClock) }
}

impl<S, C> TagEngine<S, C>
where
  S: GameStore,
  C: Clock,
{
  pub fn with_clock(store: Arc<S>, clock: C) -> Self { Self { store, clock } }

  /// Start the round with `players[it_index]` as the first "it".
  pub async fn start_round(
    &self,
    players: &[PlayerRecord],
    pin: Pin,
    it_index: usize,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
  ) -> Result<Game, S::Error> {
    let window = GameWindow::new(start_date, end_date)?;
    let it_player = players
      .get(it_index)
      .ok_or(Error::NoSuchPlayerIndex(it_index))?
      .user_id;

    let game = self.store.start_round(pin, it_player, window).await?;
    tracing::info!(
      %pin,
      %it_player,
      start = %window.start(),
      end = %window.end(),
      "round started"
    );
    Ok(game)
  }

  /// `tagger` hands "it" to `target`.
  pub async fn tag(
    &self,
    pin: Pin,
    tagger: Uuid,
    target: Uuid,
    expected_version: Option<u64>,
  ) -> Result<TagOutcome, S::Error> {
    if tagger == target {
      return Err(Error::SelfTag.into());
    }

    let outcome = self
      .store
      .tag(pin, tagger, target, self.clock.now(), expected_version)
      .await?;
    tracing::info!(
      %pin,
      %tagger,
      %target,
      tagger_time_it_ms = outcome.tagger.state.time_it_ms,
      times_caught = outcome.target.state.times_caught,
      "tagged"
    );
    Ok(outcome)
  }

  /// The round phase of `game` right now; `None` before the round starts.
  pub fn phase(&self, game: &Game) -> Option<GamePhase> {
    game.phase(self.clock.now())
  }

  /// Read the roster of `pin` as seen by `me`, with "it" time resolved as of
  /// now.
  pub async fn roster_view(&self, pin: Pin, me: Uuid) -> Result<RosterView, S::Error> {
    let game = self
      .store
      .get_game(pin)
      .await?
      .ok_or(Error::GameNotFound(pin))?;
    let players = self.store.list_players(pin).await?;
    Ok(RosterView::new(&game, players, me, self.clock.now()))
  }
}
