use std::cmp::Reverse;

use itertools::Itertools;
use serde::Deserialize;

use crate::{
  media::{
    kbps_label, lenient_u64, nullable, sort_by_quality, MediaStream, ResolutionResult,
  },
  video_id::VideoId,
  Error, Result,
};

use super::Adapter;

pub struct Invidious;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousVideo {
  title: Option<String>,
  format_streams: Option<Vec<InvidiousFormat>>,
  adaptive_formats: Option<Vec<InvidiousFormat>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InvidiousFormat {
  #[serde(deserialize_with = "nullable")]
  url: String,
  #[serde(rename = "type", deserialize_with = "nullable")]
  mime_type: String,
  quality_label: Option<String>,
  resolution: Option<String>,
  #[serde(deserialize_with = "lenient_u64")]
  bitrate: u64,
}

impl InvidiousFormat {
  fn label(&mut self) -> String {
    [self.quality_label.take(), self.resolution.take()]
      .into_iter()
      .flatten()
      .find(|l| !l.is_empty())
      .unwrap_or_else(|| "unknown".to_string())
  }
}

impl Adapter for Invidious {
  fn stream_url(&self, base: &str, video_id: &VideoId) -> String {
    format!("{base}/api/v1/videos/{video_id}")
  }

  fn normalize(&self, body: &[u8]) -> Result<ResolutionResult> {
    let resp: InvidiousVideo = serde_json::from_slice(body)?;
    if resp.format_streams.is_none() && resp.adaptive_formats.is_none() {
      return Err(Error::InvalidPayload("no formatStreams or adaptiveFormats"));
    }

    // formatStreams are progressive by construction
    let mut video_streams: Vec<_> = resp
      .format_streams
      .unwrap_or_default()
      .into_iter()
      .filter(|f| !f.url.is_empty() && f.mime_type.contains("video/mp4"))
      .map(|mut f| MediaStream {
        quality: f.label(),
        url: f.url,
      })
      .collect();
    sort_by_quality(&mut video_streams);

    let audio_streams = resp
      .adaptive_formats
      .unwrap_or_default()
      .into_iter()
      .filter(|f| !f.url.is_empty() && f.mime_type.contains("audio/mp4"))
      .sorted_by_key(|f| Reverse(f.bitrate))
      .take(1)
      .map(|f| MediaStream {
        quality: kbps_label(f.bitrate),
        url: f.url,
      })
      .collect();

    Ok(ResolutionResult::new(resp.title, video_streams, audio_streams))
  }
}
