//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use tag_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Domain(#[from] tag_core::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Split a backend error into a domain rejection or an internal failure.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.domain() {
      Some(domain) => Error::Domain(domain.clone()),
      None => Error::Store(Box::new(err)),
    }
  }

  pub fn status(&self) -> StatusCode {
    use tag_core::Error as D;

    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::Domain(d) => match d {
        D::GameNotFound(_) | D::UserNotFound(_) | D::PlayerNotFound { .. } => {
          StatusCode::NOT_FOUND
        }
        D::AlreadyInGame(_)
        | D::EmailTaken(_)
        | D::NotIt(_)
        | D::RoundNotStarted(_)
        | D::RoundNotActive(_) => StatusCode::CONFLICT,
        D::VersionMismatch { .. } => StatusCode::PRECONDITION_FAILED,
        D::SelfTag
        | D::InvalidWindow
        | D::InvalidPin(_)
        | D::NoSuchPlayerIndex(_) => StatusCode::BAD_REQUEST,
        D::UnknownStatus(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, Error::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"tag\""),
      );
    }
    res
  }
}
