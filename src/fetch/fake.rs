use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
  time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

use crate::Result;

use super::{Fetch, FetchResponse};

enum Canned {
  Ok(StatusCode, Bytes),
  Slow(Bytes),
}

/// Canned responses keyed by exact URL; unknown URLs answer 404.
/// Every request is recorded in order.
#[derive(Default)]
pub struct FakeFetch {
  routes: HashMap<String, Canned>,
  calls: Mutex<Vec<String>>,
}

impl FakeFetch {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn json(mut self, url: &str, body: impl ToString) -> Self {
    let body = Bytes::from(body.to_string());
    self.routes.insert(url.into(), Canned::Ok(StatusCode::OK, body));
    self
  }

  pub fn status(mut self, url: &str, status: u16) -> Self {
    let status = StatusCode::from_u16(status).expect("valid status");
    self.routes.insert(url.into(), Canned::Ok(status, Bytes::new()));
    self
  }

  // answers only after an hour
  pub fn slow(mut self, url: &str, body: impl ToString) -> Self {
    let body = Bytes::from(body.to_string());
    self.routes.insert(url.into(), Canned::Slow(body));
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

#[async_trait]
impl Fetch for FakeFetch {
  async fn get(&self, url: &str) -> Result<FetchResponse> {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(url.to_string());

    match self.routes.get(url) {
      Some(Canned::Ok(status, body)) => Ok(FetchResponse {
        status: *status,
        body: body.clone(),
      }),
      Some(Canned::Slow(body)) => {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(FetchResponse {
          status: StatusCode::OK,
          body: body.clone(),
        })
      }
      None => Ok(FetchResponse {
        status: StatusCode::NOT_FOUND,
        body: Bytes::new(),
      }),
    }
  }
}
