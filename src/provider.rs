mod invidious;
mod piped;

use std::fmt;

use crate::{media::ResolutionResult, video_id::VideoId, Error, Result};

use invidious::Invidious;
use piped::Piped;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
  Piped,
  Invidious,
}

impl Family {
  fn adapter(self) -> &'static dyn Adapter {
    match self {
      Family::Piped => &Piped,
      Family::Invidious => &Invidious,
    }
  }
}

impl fmt::Display for Family {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Family::Piped => f.write_str("Piped"),
      Family::Invidious => f.write_str("Invidious"),
    }
  }
}

/// Knows one provider family's endpoint layout and response shape.
pub trait Adapter: Sync {
  fn stream_url(&self, base: &str, video_id: &VideoId) -> String;

  /// Normalizes a raw response body. A body that decodes but yields no
  /// usable stream is a miss, same as one that does not decode.
  fn normalize(&self, body: &[u8]) -> Result<ResolutionResult>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderEndpoint {
  pub base_url: String,
  pub family: Family,
}

impl ProviderEndpoint {
  pub fn new(base_url: impl Into<String>, family: Family) -> Self {
    let base_url = base_url.into();
    let base_url = match base_url.strip_suffix('/') {
      Some(stripped) => stripped.to_string(),
      None => base_url,
    };
    Self { base_url, family }
  }

  pub fn piped(base_url: impl Into<String>) -> Self {
    Self::new(base_url, Family::Piped)
  }

  pub fn invidious(base_url: impl Into<String>) -> Self {
    Self::new(base_url, Family::Invidious)
  }

  // accepts a bare domain like the `piped_instance` query parameter does
  pub fn from_host(host: &str, family: Family) -> Self {
    if host.starts_with("http://") || host.starts_with("https://") {
      Self::new(host, family)
    } else {
      Self::new(format!("https://{host}"), family)
    }
  }

  pub fn stream_url(&self, video_id: &VideoId) -> String {
    self.family.adapter().stream_url(&self.base_url, video_id)
  }

  pub fn normalize(&self, body: &[u8]) -> Result<ResolutionResult> {
    let result = self.family.adapter().normalize(body)?;
    if !result.has_streams() {
      return Err(Error::NoUsableStreams);
    }
    Ok(result)
  }
}

impl fmt::Display for ProviderEndpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} instance {}", self.family, self.base_url)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_endpoint_urls() {
    let id = VideoId::from_url("https://youtu.be/dQw4w9WgXcQ").unwrap();

    let piped = ProviderEndpoint::piped("https://pipedapi.kavin.rocks/");
    assert_eq!(
      piped.stream_url(&id),
      "https://pipedapi.kavin.rocks/streams/dQw4w9WgXcQ"
    );

    let invidious = ProviderEndpoint::invidious("https://yewtu.be");
    assert_eq!(
      invidious.stream_url(&id),
      "https://yewtu.be/api/v1/videos/dQw4w9WgXcQ"
    );
  }

  #[test]
  fn test_from_host() {
    let e = ProviderEndpoint::from_host("pipedapi.example.org", Family::Piped);
    assert_eq!(e.base_url, "https://pipedapi.example.org");
    let e = ProviderEndpoint::from_host("http://10.0.0.2:8080/", Family::Piped);
    assert_eq!(e.base_url, "http://10.0.0.2:8080");
  }

  #[test]
  fn test_empty_after_filtering_is_a_miss() {
    let body = br#"{"title":"x","videoStreams":[{"url":"u","mimeType":"video/webm"}],"audioStreams":[]}"#;
    let res = ProviderEndpoint::piped("https://p.example").normalize(body);
    assert!(matches!(res, Err(Error::NoUsableStreams)));
  }
}
