//! Error types for `tag-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{pin::Pin, window::GamePhase};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("game not found: {0}")]
  GameNotFound(Pin),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("player {user_id} is not in game {pin}")]
  PlayerNotFound { pin: Pin, user_id: Uuid },

  #[error("user is already in game {0}")]
  AlreadyInGame(Pin),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("cannot tag yourself")]
  SelfTag,

  #[error("player {0} is not it")]
  NotIt(Uuid),

  #[error("game {0} has not been started")]
  RoundNotStarted(Pin),

  #[error("round is {0}, tagging is closed")]
  RoundNotActive(GamePhase),

  #[error("game window starts after it ends")]
  InvalidWindow,

  #[error("invalid game pin: {0:?}")]
  InvalidPin(String),

  #[error("no player at index {0}")]
  NoSuchPlayerIndex(usize),

  #[error("game version is {actual}, expected {expected}")]
  VersionMismatch { expected: u64, actual: u64 },

  #[error("unknown tag status: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
