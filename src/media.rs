use std::cmp::Reverse;

use serde::{Deserialize, Deserializer, Serialize};

pub const UNTITLED: &str = "Untitled Video";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaStream {
  pub quality: String,
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub title: String,
  pub video_streams: Vec<MediaStream>,
  pub audio_streams: Vec<MediaStream>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl ResolutionResult {
  pub fn new(
    title: Option<String>,
    video_streams: Vec<MediaStream>,
    audio_streams: Vec<MediaStream>,
  ) -> Self {
    Self {
      title: title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string()),
      video_streams,
      audio_streams,
      error: None,
    }
  }

  // streams unavailable but the title is known
  pub fn title_only(title: Option<String>, notice: &str) -> Self {
    Self {
      error: Some(notice.to_string()),
      ..Self::new(title, vec![], vec![])
    }
  }

  pub fn unavailable(reason: &str) -> Self {
    Self {
      title: String::new(),
      video_streams: vec![],
      audio_streams: vec![],
      error: Some(reason.to_string()),
    }
  }

  pub fn has_streams(&self) -> bool {
    !self.video_streams.is_empty() || !self.audio_streams.is_empty()
  }
}

/// Leading digits of a quality label, e.g. `720` for `"720p60"`.
pub fn quality_rank(label: &str) -> Option<u32> {
  let digits: String =
    label.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
  digits.parse().ok()
}

/// Stable sort by descending numeric quality. Labels without leading
/// digits go last.
pub fn sort_by_quality(streams: &mut [MediaStream]) {
  streams.sort_by_key(|s| Reverse(quality_rank(&s.quality)));
}

pub fn kbps_label(bitrate: u64) -> String {
  format!("{}kbps", (bitrate as f64 / 1000.0).round() as u64)
}

/// Reads an explicit `null` as the type's default, like a missing field.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// providers are inconsistent about encoding bitrates as numbers or strings
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum NumOrStr {
    Num(f64),
    Str(String),
  }

  let value = match Option::<NumOrStr>::deserialize(deserializer)? {
    Some(NumOrStr::Num(n)) if n > 0.0 => n as u64,
    Some(NumOrStr::Str(s)) => s.trim().parse::<f64>().map_or(0, |n| n as u64),
    _ => 0,
  };
  Ok(value)
}
