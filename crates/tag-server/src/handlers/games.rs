//! Handlers for `/games` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/games` | Creates a game under a fresh PIN; 201 |
//! | `GET`  | `/games/:pin` | Game plus its current phase |
//! | `GET`  | `/games/:pin/players` | Roster with "it" time resolved |
//! | `POST` | `/games/:pin/join` | Joins as the caller |
//! | `POST` | `/games/:pin/leave` | Body: `{"confirm":true}`; 204 |
//! | `POST` | `/games/:pin/start` | Body: `{"it_index","start_date","end_date"}` |
//! | `POST` | `/games/:pin/tag` | Body: `{"target","confirm","expected_version"?}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tag_core::{
  game::Game,
  pin::Pin,
  player::PlayerRecord,
  roster::RosterView,
  store::GameStore,
  window::GamePhase,
};
use uuid::Uuid;

use crate::{AppState, auth::SignedIn, error::Error};

/// A game together with the phase it is in right now.
#[derive(Debug, Serialize)]
pub struct GameBody {
  #[serde(flatten)]
  pub game:  Game,
  pub phase: Option<GamePhase>,
}

impl GameBody {
  fn new<S: GameStore>(state: &AppState<S>, game: Game) -> Self {
    let phase = state.engine.phase(&game);
    Self { game, phase }
  }
}

fn parse_pin(raw: &str) -> Result<Pin, Error> { Ok(raw.parse::<Pin>()?) }

// ─── Create / get ─────────────────────────────────────────────────────────────

/// `POST /games`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
) -> Result<impl IntoResponse, Error>
where
  S: GameStore + 'static,
{
  let game = state.directory.create_game().await.map_err(Error::store)?;
  tracing::debug!(pin = %game.pin, %user_id, "game created by user");
  Ok((StatusCode::CREATED, Json(GameBody::new(&state, game))))
}

/// `GET /games/:pin`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  SignedIn(_): SignedIn,
  Path(pin): Path<String>,
) -> Result<Json<GameBody>, Error>
where
  S: GameStore + 'static,
{
  let pin = parse_pin(&pin)?;
  let game = state.directory.get_game(pin).await.map_err(Error::store)?;
  Ok(Json(GameBody::new(&state, game)))
}

/// `GET /games/:pin/players`
pub async fn players<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
  Path(pin): Path<String>,
) -> Result<Json<RosterView>, Error>
where
  S: GameStore + 'static,
{
  let pin = parse_pin(&pin)?;
  let view = state
    .engine
    .roster_view(pin, user_id)
    .await
    .map_err(Error::store)?;
  Ok(Json(view))
}

// ─── Membership ───────────────────────────────────────────────────────────────

/// `POST /games/:pin/join`
pub async fn join<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
  Path(pin): Path<String>,
) -> Result<Json<PlayerRecord>, Error>
where
  S: GameStore + 'static,
{
  let pin = parse_pin(&pin)?;
  let profile = state
    .store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(tag_core::Error::UserNotFound(user_id))?;

  let record = state
    .members
    .join_game(pin, user_id, profile.name)
    .await
    .map_err(Error::store)?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct LeaveBody {
  #[serde(default)]
  pub confirm: bool,
}

/// `POST /games/:pin/leave`
pub async fn leave<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
  Path(pin): Path<String>,
  Json(body): Json<LeaveBody>,
) -> Result<StatusCode, Error>
where
  S: GameStore + 'static,
{
  let pin = parse_pin(&pin)?;
  if !body.confirm {
    return Err(Error::BadRequest("leaving must be confirmed".into()));
  }
  state
    .members
    .leave_game(pin, user_id)
    .await
    .map_err(Error::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Rounds ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartBody {
  /// Index into the roster, in join order.
  pub it_index:   usize,
  pub start_date: DateTime<Utc>,
  pub end_date:   DateTime<Utc>,
}

/// `POST /games/:pin/start`
///
/// Only players on the roster may start (or restart) the round.
pub async fn start<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
  Path(pin): Path<String>,
  Json(body): Json<StartBody>,
) -> Result<Json<GameBody>, Error>
where
  S: GameStore + 'static,
{
  let pin = parse_pin(&pin)?;
  let players = state.members.roster(pin).await.map_err(Error::store)?;
  if !players.iter().any(|p| p.user_id == user_id) {
    return Err(tag_core::Error::PlayerNotFound { pin, user_id }.into());
  }

  let game = state
    .engine
    .start_round(&players, pin, body.it_index, body.start_date, body.end_date)
    .await
    .map_err(Error::store)?;
  Ok(Json(GameBody::new(&state, game)))
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
  pub target:           Uuid,
  #[serde(default)]
  pub confirm:          bool,
  /// The roster version the caller last saw.
  pub expected_version: Option<u64>,
}

/// `POST /games/:pin/tag`
///
/// The caller tags `target`. Answers with the caller's roster view, brought
/// up to date with the tag.
pub async fn tag<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
  Path(pin): Path<String>,
  Json(body): Json<TagBody>,
) -> Result<Json<RosterView>, Error>
where
  S: GameStore + 'static,
{
  let pin = parse_pin(&pin)?;
  if !body.confirm {
    return Err(Error::BadRequest("tag must be confirmed".into()));
  }

  let mut view = state
    .engine
    .roster_view(pin, user_id)
    .await
    .map_err(Error::store)?;
  if view.my_status.is_none() {
    return Err(tag_core::Error::PlayerNotFound { pin, user_id }.into());
  }
  match view.phase {
    None => return Err(tag_core::Error::RoundNotStarted(pin).into()),
    Some(phase) if !phase.accepts_tags() => {
      return Err(tag_core::Error::RoundNotActive(phase).into());
    }
    Some(_) => {}
  }
  if body.target == user_id {
    return Err(tag_core::Error::SelfTag.into());
  }

  let outcome = state
    .engine
    .tag(pin, user_id, body.target, body.expected_version)
    .await
    .map_err(Error::store)?;
  view.apply_tag(&outcome);
  Ok(Json(view))
}
