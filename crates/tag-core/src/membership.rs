//! Membership manager: joining and leaving games.

use std::sync::Arc;

use uuid::Uuid;

use crate::{pin::Pin, player::PlayerRecord, store::GameStore};

pub struct Membership<S> {
  store: Arc<S>,
}

impl<S: GameStore> Membership<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Join `pin` as `user_id`, displayed as `name`.
  ///
  /// Rejoining the same game resets the player's statistics; calling this
  /// twice converges on the same default record.
  pub async fn join_game(
    &self,
    pin: Pin,
    user_id: Uuid,
    name: impl Into<String>,
  ) -> Result<PlayerRecord, S::Error> {
    let record = self.store.join_game(pin, user_id, name.into()).await?;
    tracing::info!(%pin, %user_id, "player joined");
    Ok(record)
  }

  pub async fn leave_game(&self, pin: Pin, user_id: Uuid) -> Result<(), S::Error> {
    self.store.leave_game(pin, user_id).await?;
    tracing::info!(%pin, %user_id, "player left");
    Ok(())
  }

  pub async fn roster(&self, pin: Pin) -> Result<Vec<PlayerRecord>, S::Error> {
    self.store.list_players(pin).await
  }
}
