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

pub struct Piped;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStreams {
  title: Option<String>,
  video_streams: Option<Vec<PipedStream>>,
  audio_streams: Option<Vec<PipedStream>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PipedStream {
  #[serde(deserialize_with = "nullable")]
  url: String,
  #[serde(deserialize_with = "nullable")]
  quality: String,
  #[serde(deserialize_with = "nullable")]
  mime_type: String,
  #[serde(deserialize_with = "nullable")]
  video_only: bool,
  #[serde(deserialize_with = "lenient_u64")]
  bitrate: u64,
}

impl Adapter for Piped {
  fn stream_url(&self, base: &str, video_id: &VideoId) -> String {
    format!("{base}/streams/{video_id}")
  }

  fn normalize(&self, body: &[u8]) -> Result<ResolutionResult> {
    let resp: PipedStreams = serde_json::from_slice(body)?;
    if resp.video_streams.is_none() && resp.audio_streams.is_none() {
      return Err(Error::InvalidPayload("no videoStreams or audioStreams"));
    }

    // progressive only: there is no muxing step downstream
    let mut video_streams: Vec<_> = resp
      .video_streams
      .unwrap_or_default()
      .into_iter()
      .filter(|s| !s.url.is_empty())
      .filter(|s| s.mime_type == "video/mp4" && !s.video_only)
      .map(|s| MediaStream {
        quality: s.quality,
        url: s.url,
      })
      .collect();
    sort_by_quality(&mut video_streams);

    let audio_streams = resp
      .audio_streams
      .unwrap_or_default()
      .into_iter()
      .filter(|s| !s.url.is_empty())
      .filter(|s| s.mime_type == "audio/mp4")
      .sorted_by_key(|s| Reverse(s.bitrate))
      .take(1)
      .map(|s| MediaStream {
        quality: kbps_label(s.bitrate),
        url: s.url,
      })
      .collect();

    Ok(ResolutionResult::new(resp.title, video_streams, audio_streams))
  }
}
