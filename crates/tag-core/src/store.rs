//! The `GameStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tag-store-sqlite`).
//! The directory, membership manager, and tag engine depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  game::Game,
  pin::Pin,
  player::PlayerRecord,
  user::{Credentials, NewUser, UserProfile},
  window::GameWindow,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend error types wrap [`crate::Error`] for domain failures (unknown
/// game, self-tag, ...) and expose it so callers can tell those apart from
/// I/O problems.
pub trait StoreError:
  std::error::Error + From<crate::Error> + Send + Sync + 'static
{
  /// The domain error, if this is one.
  fn domain(&self) -> Option<&crate::Error>;
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Everything a tag changed, as committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutcome {
  pub game:   Game,
  pub tagger: PlayerRecord,
  pub target: PlayerRecord,
  /// The instant the tag was applied.
  pub at:     DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a tag game backend.
///
/// Every method that touches more than one document (a profile and a roster
/// entry, or a game and its roster) must apply all of its writes atomically
/// or none of them.
pub trait GameStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a profile in its "no game" state. Fails with
  /// [`crate::Error::EmailTaken`] if the email is registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Look up sign-in credentials by email.
  fn get_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  // ── Games ─────────────────────────────────────────────────────────────

  /// Insert `Game::new(pin, now)` unless a game with `pin` exists.
  /// Returns `None` when the PIN is taken; the existing game is untouched.
  fn create_game(
    &self,
    pin: Pin,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Game>, Self::Error>> + Send + '_;

  fn get_game(
    &self,
    pin: Pin,
  ) -> impl Future<Output = Result<Option<Game>, Self::Error>> + Send + '_;

  /// The roster of `pin` in join order. Fails with
  /// [`crate::Error::GameNotFound`] if the game does not exist.
  fn list_players(
    &self,
    pin: Pin,
  ) -> impl Future<Output = Result<Vec<PlayerRecord>, Self::Error>> + Send + '_;

  // ── Membership ────────────────────────────────────────────────────────

  /// Write a default roster entry for `user_id` (overwriting any previous
  /// one) and point the profile at `pin`. Both copies are reset to the
  /// joined defaults.
  fn join_game(
    &self,
    pin: Pin,
    user_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<PlayerRecord, Self::Error>> + Send + '_;

  /// Remove the roster entry and reset the profile. Clears the game's
  /// `current_it` if it pointed at the leaver.
  ///
  /// The round stays active when the "it" player leaves, with nobody "it";
  /// no tag can succeed until the round is started again.
  fn leave_game(
    &self,
    pin: Pin,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Rounds ────────────────────────────────────────────────────────────

  /// Activate the game with `window` and make `it_player` the only "it",
  /// from `window.start()`. Every other player is reset.
  fn start_round(
    &self,
    pin: Pin,
    it_player: Uuid,
    window: GameWindow,
  ) -> impl Future<Output = Result<Game, Self::Error>> + Send + '_;

  /// Apply [`crate::transition::tag`] to the current records of `tagger` and
  /// `target` and write all four copies.
  ///
  /// Fails with [`crate::Error::RoundNotActive`] unless `now` lies inside the
  /// game window. With `expected_version` set, fails with
  /// [`crate::Error::VersionMismatch`] unless the game is at that version.
  fn tag(
    &self,
    pin: Pin,
    tagger: Uuid,
    target: Uuid,
    now: DateTime<Utc>,
    expected_version: Option<u64>,
  ) -> impl Future<Output = Result<TagOutcome, Self::Error>> + Send + '_;
}
