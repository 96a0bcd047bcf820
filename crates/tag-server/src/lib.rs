//! JSON-over-HTTP front end for the tag game.
//!
//! Exposes an axum [`Router`] backed by any [`GameStore`]. Every route except
//! sign-up requires HTTP Basic credentials (see [`auth`]).

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tag_core::{
  directory::GameDirectory,
  engine::TagEngine,
  membership::Membership,
  store::GameStore,
};
use tower_http::trace::TraceLayer;

use handlers::{games, users};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `TAG_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/tag/tag.db"),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers. The components share one
/// store handle.
pub struct AppState<S: GameStore> {
  pub store:     Arc<S>,
  pub directory: Arc<GameDirectory<S>>,
  pub members:   Arc<Membership<S>>,
  pub engine:    Arc<TagEngine<S>>,
}

impl<S: GameStore> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      directory: Arc::new(GameDirectory::new(store.clone())),
      members:   Arc::new(Membership::new(store.clone())),
      engine:    Arc::new(TagEngine::new(store.clone())),
      store,
    }
  }
}

impl<S: GameStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      directory: self.directory.clone(),
      members:   self.members.clone(),
      engine:    self.engine.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the tag service.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: GameStore + 'static,
{
  Router::new()
    .route("/users",                post(users::sign_up::<S>))
    .route("/users/me",             get(users::me::<S>))
    .route("/games",                post(games::create::<S>))
    .route("/games/{pin}",          get(games::get_one::<S>))
    .route("/games/{pin}/players",  get(games::players::<S>))
    .route("/games/{pin}/join",     post(games::join::<S>))
    .route("/games/{pin}/leave",    post(games::leave::<S>))
    .route("/games/{pin}/start",    post(games::start::<S>))
    .route("/games/{pin}/tag",      post(games::tag::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
