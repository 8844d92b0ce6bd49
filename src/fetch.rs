#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

use crate::{Error, Result};

const USER_AGENT: &str = "Mozilla/5.0";

pub struct FetchResponse {
  pub status: StatusCode,
  pub body: Bytes,
}

#[async_trait]
pub trait Fetch: Send + Sync {
  async fn get(&self, url: &str) -> Result<FetchResponse>;
}

pub struct HttpFetch {
  client: reqwest::Client,
}

impl HttpFetch {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl Fetch for HttpFetch {
  async fn get(&self, url: &str) -> Result<FetchResponse> {
    let resp = self.client.get(url).send().await?;
    let status = resp.status();
    let body = resp.bytes().await?;
    Ok(FetchResponse { status, body })
  }
}

/// GET `url`, giving up after `timeout`. Anything but a 2xx is an error.
pub async fn get_ok(
  fetch: &dyn Fetch,
  url: &str,
  timeout: Duration,
) -> Result<Bytes> {
  let resp = tokio::time::timeout(timeout, fetch.get(url))
    .await
    .map_err(|_| Error::Timeout(timeout))??;

  if !resp.status.is_success() {
    return Err(Error::Status(resp.status));
  }

  Ok(resp.body)
}

#[cfg(test)]
mod test {
  use super::fake::FakeFetch;
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_get_ok_timeout() {
    let fetch = FakeFetch::new().slow("https://slow.example/", "{}");
    let res = get_ok(&fetch, "https://slow.example/", Duration::from_secs(4))
      .await;
    assert!(matches!(res, Err(Error::Timeout(_))));
  }

  #[tokio::test]
  async fn test_get_ok_status() {
    let fetch = FakeFetch::new().status("https://down.example/", 502);
    let res = get_ok(&fetch, "https://down.example/", Duration::from_secs(4))
      .await;
    assert!(matches!(res, Err(Error::Status(s)) if s == StatusCode::BAD_GATEWAY));

    let res = get_ok(&fetch, "https://unknown.example/", Duration::from_secs(4))
      .await;
    assert!(matches!(res, Err(Error::Status(s)) if s == StatusCode::NOT_FOUND));
    assert_eq!(fetch.calls().len(), 2);
  }
}
