//! HTTP Basic-auth extractor and password hashing.
//!
//! Credentials are `email:password`; the password is checked against the
//! argon2 PHC string stored at sign-up.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use tag_core::store::GameStore;
use uuid::Uuid;

use crate::{AppState, error::Error};

/// The authenticated caller's user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedIn(pub Uuid);

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Pull `(email, password)` out of a Basic `Authorization` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

fn verify_password(password: &str, hash: &str) -> Result<(), Error> {
  let parsed_hash = PasswordHash::new(hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

impl<S> FromRequestParts<AppState<S>> for SignedIn
where
  S: GameStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let Some(creds) = state
      .store
      .get_credentials(&email)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(%email, "sign-in for unknown email");
      return Err(Error::Unauthorized);
    };

    if let Err(e) = verify_password(&password, &creds.password_hash) {
      tracing::debug!(%email, "sign-in with wrong password");
      return Err(e);
    }
    Ok(SignedIn(creds.user_id))
  }
}
