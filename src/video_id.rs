use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::{Error, Result};

static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
    .expect("regex is hard-coded, thus must be valid")
});

const VIDEO_ID_LEN: usize = 11;

/// The 11-character identifier of a YouTube video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
  pub fn from_url(input: &str) -> Result<Self> {
    let input = input.trim();
    if input.is_empty() {
      return Err(Error::MalformedInput("YouTube URL is required."));
    }

    if Url::parse(input).is_err() {
      return Err(Error::MalformedInput("Invalid YouTube URL."));
    }

    VIDEO_ID_REGEX
      .captures(input)
      .and_then(|caps| caps.get(2))
      .map(|m| m.as_str())
      .filter(|id| id.chars().count() == VIDEO_ID_LEN)
      .map(|id| VideoId(id.to_string()))
      .ok_or(Error::MalformedInput("Invalid YouTube URL."))
  }

  pub fn watch_url(&self) -> String {
    format!("http://www.youtube.com/watch?v={}", self.0)
  }
}

impl fmt::Display for VideoId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
