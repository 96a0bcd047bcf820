//! User profiles, one per signed-up identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{pin::Pin, player::PlayerState};

/// The per-user copy of a player's game state.
///
/// Never deleted; leaving a game resets it to [`UserProfile::reset`]
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:    Uuid,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
  pub in_game:    bool,
  #[serde(flatten)]
  pub state:      PlayerState,
  pub game_pin:   Option<Pin>,
}

impl UserProfile {
  /// Clear all game membership and tag statistics.
  pub fn reset(&mut self) {
    self.in_game = false;
    self.state = PlayerState::default();
    self.game_pin = None;
  }
}

/// Input to [`crate::store::GameStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  /// argon2 PHC string; the plaintext password never reaches the store.
  pub password_hash: String,
}

/// What the identity adapter needs to verify a sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user_id:       Uuid,
  pub password_hash: String,
}
