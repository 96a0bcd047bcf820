//! Game directory: PIN allocation and game lookup.

use std::sync::Arc;

use crate::{
  Error,
  clock::{Clock, SystemClock},
  game::Game,
  pin::{Pin, PinSource, RandomPins},
  store::GameStore,
};

pub struct GameDirectory<S, P = RandomPins, C = SystemClock> {
  store: Arc<S>,
  pins:  P,
  clock: C,
}

impl<S: GameStore> GameDirectory<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_sources(store, RandomPins, SystemClock)
  }
}

impl<S, P, C> GameDirectory<S, P, C>
where
  S: GameStore,
  P: PinSource,
  C: Clock,
{
  pub fn with_sources(store: Arc<S>, pins: P, clock: C) -> Self {
    Self { store, pins, clock }
  }

  /// Create a game under a fresh PIN.
  ///
  /// Samples until the store accepts one. The insert is conditional, so two
  /// concurrent callers drawing the same PIN cannot both win; the loser
  /// draws again. There is no retry bound.
  pub async fn create_game(&self) -> Result<Game, S::Error> {
    loop {
      let pin = self.pins.sample();
      match self.store.create_game(pin, self.clock.now()).await? {
        Some(game) => {
          tracing::info!(%pin, "game created");
          return Ok(game);
        }
        None => tracing::debug!(%pin, "pin taken, resampling"),
      }
    }
  }

  pub async fn get_game(&self, pin: Pin) -> Result<Game, S::Error> {
    self
      .store
      .get_game(pin)
      .await?
      .ok_or_else(|| Error::GameNotFound(pin).into())
  }
}
