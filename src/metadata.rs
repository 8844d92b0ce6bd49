use std::time::Duration;

use serde::Deserialize;

use crate::{
  fetch::{get_ok, Fetch},
  media::ResolutionResult,
  video_id::VideoId,
  Result,
};

pub const OEMBED_URL: &str = "https://www.youtube.com/oembed";

pub const TITLE_ONLY_NOTICE: &str =
  "Could not load download links, but title is available.";

#[derive(Deserialize)]
struct OEmbed {
  title: Option<String>,
}

pub fn oembed_url(video_id: &VideoId) -> String {
  format!("{OEMBED_URL}?url={}&format=json", video_id.watch_url())
}

/// Looks up only the title. The result carries no streams and a notice
/// explaining why.
pub async fn fetch_title_only(
  fetch: &dyn Fetch,
  video_id: &VideoId,
  timeout: Duration,
) -> Result<ResolutionResult> {
  let body = get_ok(fetch, &oembed_url(video_id), timeout).await?;
  let oembed: OEmbed = serde_json::from_slice(&body)?;
  Ok(ResolutionResult::title_only(oembed.title, TITLE_ONLY_NOTICE))
}
