//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: `{"name","email","password"}`; no auth |
//! | `GET`  | `/users/me` | The caller's profile |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tag_core::{
  store::GameStore,
  user::{NewUser, UserProfile},
};

use crate::{
  AppState,
  auth::{SignedIn, hash_password},
  error::Error,
};

// ─── Sign up ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /users`
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse, Error>
where
  S: GameStore + 'static,
{
  let name = body.name.trim();
  let email = body.email.trim();
  if name.is_empty() {
    return Err(Error::BadRequest("name must not be empty".into()));
  }
  if !email.contains('@') {
    return Err(Error::BadRequest(format!("not an email address: {email:?}")));
  }
  if body.password.is_empty() {
    return Err(Error::BadRequest("password must not be empty".into()));
  }

  let password_hash = hash_password(&body.password)
    .map_err(|e| Error::Store(format!("argon2 error: {e}").into()))?;

  let profile = state
    .store
    .create_user(NewUser {
      name: name.to_owned(),
      email: email.to_owned(),
      password_hash,
    })
    .await
    .map_err(Error::store)?;
  tracing::info!(user_id = %profile.user_id, "user signed up");

  Ok((StatusCode::CREATED, Json(profile)))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  SignedIn(user_id): SignedIn,
) -> Result<Json<UserProfile>, Error>
where
  S: GameStore + 'static,
{
  let profile = state
    .store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(tag_core::Error::UserNotFound(user_id))?;
  Ok(Json(profile))
}
