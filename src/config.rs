use std::{net::SocketAddr, str::FromStr, time::Duration};

use crate::{directory::PIPED_DIRECTORY_URL, resolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub bind_addr: SocketAddr,
  pub provider_timeout: Duration,
  pub candidate_limit: usize,
  // `None` turns the response cache off
  pub cache_ttl: Option<Duration>,
  pub directory_ttl: Duration,
  pub directory_url: Option<String>,
  // how long in-flight requests may run on after SIGINT/SIGTERM
  pub shutdown_timeout: Duration,
}

impl Config {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

    let bind_addr = lookup("BIND_ADDR")
      .and_then(|s| SocketAddr::from_str(s.trim()).ok())
      .unwrap_or_else(default_bind_addr);

    let provider_timeout = parse("PROVIDER_TIMEOUT_MS")
      .filter(|&ms| ms > 0)
      .map(Duration::from_millis)
      .unwrap_or(resolver::DEFAULT_TIMEOUT);

    let candidate_limit = parse("CANDIDATE_LIMIT")
      .filter(|&n| n > 0)
      .map(|n| n as usize)
      .unwrap_or(resolver::DEFAULT_CANDIDATE_LIMIT);

    let cache_ttl = match parse("CACHE_TTL_SECS") {
      Some(0) => None,
      Some(secs) => Some(Duration::from_secs(secs)),
      None => Some(Duration::from_secs(5 * 60)),
    };

    let directory_ttl = Duration::from_secs(
      parse("DIRECTORY_TTL_SECS").unwrap_or(60 * 60),
    );

    let directory_url = match lookup("REMOTE_DIRECTORY").as_deref() {
      Some("0") | Some("false") => None,
      _ => Some(
        lookup("PIPED_DIRECTORY_URL")
          .filter(|s| s.starts_with("http"))
          .unwrap_or_else(|| PIPED_DIRECTORY_URL.to_string()),
      ),
    };

    let shutdown_timeout = Duration::from_secs(
      parse("SHUTDOWN_TIMEOUT_SECS").unwrap_or(10),
    );

    Self {
      bind_addr,
      provider_timeout,
      candidate_limit,
      cache_ttl,
      directory_ttl,
      directory_url,
      shutdown_timeout,
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::from_lookup(|_| None)
  }
}

fn default_bind_addr() -> SocketAddr {
  SocketAddr::from(([0, 0, 0, 0], 8080))
}
