use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use axum::{
  extract::{rejection::QueryRejection, FromRequestParts, Query, State},
  response::IntoResponse,
  routing::get,
  Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
  media::ResolutionResult,
  provider::{Family, ProviderEndpoint},
  resolver::Resolver,
  Error, Result,
};

pub fn router(resolver: Arc<Resolver>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/resolve", get(resolve))
    .with_state(resolver)
}

#[derive(Deserialize)]
pub struct ResolveQuery {
  url: Option<String>,
}

#[axum::debug_handler]
pub async fn resolve(
  State(resolver): State<Arc<Resolver>>,
  PreferredInstance(preferred): PreferredInstance,
  query: std::result::Result<Query<ResolveQuery>, QueryRejection>,
) -> Result<Json<ResolutionResult>> {
  let Query(query) = query.map_err(|e| {
    debug!("rejected query string: {}", e);
    Error::MalformedInput("YouTube URL is required.")
  })?;
  let url = query.url.unwrap_or_default();
  let result = resolver.resolve(&url, preferred).await?;
  Ok(Json(result))
}

async fn health() -> impl IntoResponse {
  "ok".to_owned()
}

/// A Piped instance named by the caller through `&piped_instance=<host>`.
pub struct PreferredInstance(pub Option<ProviderEndpoint>);

#[derive(Deserialize)]
struct PipedInstanceQuery {
  piped_instance: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for PreferredInstance
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut http::request::Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let instance =
      Query::<PipedInstanceQuery>::from_request_parts(parts, state)
        .await
        .ok()
        .map(|query| query.0.piped_instance)
        .filter(|host| !host.trim().is_empty())
        .map(|host| ProviderEndpoint::from_host(host.trim(), Family::Piped));

    Ok(PreferredInstance(instance))
  }
}
