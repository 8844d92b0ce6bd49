use axum::{
  response::{IntoResponse, Response},
  Json,
};
use reqwest::StatusCode;
use serde_json::json;

use crate::media::ResolutionResult;

pub const UNAVAILABLE_MESSAGE: &str =
  "All downloader services failed. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("{0}")]
  MalformedInput(&'static str),

  // causes of a single provider miss, absorbed by the resolver
  #[error("timed out after {0:?}")]
  Timeout(std::time::Duration),
  #[error("responded with status {0}")]
  Status(StatusCode),
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("malformed json: {0}")]
  Json(#[from] serde_json::Error),
  #[error("returned invalid data: {0}")]
  InvalidPayload(&'static str),
  #[error("no usable streams")]
  NoUsableStreams,

  // internal to the resolver, which always follows it with the title lookup
  #[error("every provider missed")]
  AllProvidersExhausted,
  #[error("all providers and the metadata fallback failed")]
  MetadataUnavailable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::MalformedInput(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
      }
      Error::MetadataUnavailable => (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ResolutionResult::unavailable(UNAVAILABLE_MESSAGE)),
      )
        .into_response(),
      err => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
      )
        .into_response(),
    }
  }
}
