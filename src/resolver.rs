use std::{sync::Arc, time::Duration};

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
  cache::TtlCache,
  directory::ProviderDirectory,
  fetch::{get_ok, Fetch},
  media::ResolutionResult,
  metadata,
  provider::ProviderEndpoint,
  video_id::VideoId,
  Error, Result,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_CANDIDATE_LIMIT: usize = 5;

/// Turns a YouTube URL into direct stream links by walking provider
/// mirrors one at a time: Piped instances first, then Invidious, then a
/// title-only lookup.
pub struct Resolver {
  fetch: Arc<dyn Fetch>,
  directory: ProviderDirectory,
  cache: Option<TtlCache<String, ResolutionResult>>,
  timeout: Duration,
  candidate_limit: usize,
}

impl Resolver {
  pub fn new(fetch: Arc<dyn Fetch>, directory: ProviderDirectory) -> Self {
    Self {
      fetch,
      directory,
      cache: None,
      timeout: DEFAULT_TIMEOUT,
      candidate_limit: DEFAULT_CANDIDATE_LIMIT,
    }
  }

  pub fn with_cache(self, cache: Option<TtlCache<String, ResolutionResult>>) -> Self {
    Self { cache, ..self }
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    Self { timeout, ..self }
  }

  pub fn with_candidate_limit(self, candidate_limit: usize) -> Self {
    Self {
      candidate_limit,
      ..self
    }
  }

  /// Resolves `url`, trying `preferred` before any directory candidate.
  /// Only a malformed URL or total exhaustion surfaces as an error.
  pub async fn resolve(
    &self,
    url: &str,
    preferred: Option<ProviderEndpoint>,
  ) -> Result<ResolutionResult> {
    let video_id = VideoId::from_url(url)?;

    // answers from a caller-named instance stay out of the shared cache
    let cache = self.cache.as_ref().filter(|_| preferred.is_none());

    if let Some(hit) = cache.and_then(|c| c.get(url)) {
      debug!("cache hit for {}", url);
      return Ok(hit);
    }

    match self.resolve_streams(&video_id, preferred).await {
      Ok(result) => {
        if let Some(cache) = cache {
          cache.put(url.to_string(), result.clone());
        }
        return Ok(result);
      }
      Err(e) => warn!("{} for {}, falling back to metadata only", e, video_id),
    }

    match metadata::fetch_title_only(&*self.fetch, &video_id, self.timeout).await {
      Ok(result) => Ok(result),
      Err(e) => {
        warn!("metadata fallback failed for {}: {}", video_id, e);
        Err(Error::MetadataUnavailable)
      }
    }
  }

  async fn resolve_streams(
    &self,
    video_id: &VideoId,
    preferred: Option<ProviderEndpoint>,
  ) -> Result<ResolutionResult> {
    let candidates = self.directory.candidates().await;

    let piped = preferred
      .into_iter()
      .chain(candidates.piped.into_iter().take(self.candidate_limit))
      .unique();
    if let Some(result) = self.first_usable(piped, video_id).await {
      return Ok(result);
    }

    warn!("all Piped instances failed for {}, trying Invidious", video_id);
    let invidious = candidates.invidious.into_iter().take(self.candidate_limit);
    if let Some(result) = self.first_usable(invidious, video_id).await {
      return Ok(result);
    }

    Err(Error::AllProvidersExhausted)
  }

  // strictly sequential; the first usable answer wins
  async fn first_usable(
    &self,
    endpoints: impl Iterator<Item = ProviderEndpoint>,
    video_id: &VideoId,
  ) -> Option<ResolutionResult> {
    for endpoint in endpoints {
      match self.attempt(&endpoint, video_id).await {
        Ok(result) => {
          info!("resolved {} via {}", video_id, endpoint);
          return Some(result);
        }
        Err(e) => warn!("{} failed for {}: {}", endpoint, video_id, e),
      }
    }
    None
  }

  async fn attempt(
    &self,
    endpoint: &ProviderEndpoint,
    video_id: &VideoId,
  ) -> Result<ResolutionResult> {
    let url = endpoint.stream_url(video_id);
    let body = get_ok(&*self.fetch, &url, self.timeout).await?;
    endpoint.normalize(&body)
  }
}
