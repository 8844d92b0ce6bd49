use std::{
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use itertools::Itertools;
use rand::{seq::SliceRandom, RngCore};
use tracing::{debug, warn};

use crate::{
  cache::{Clock, TtlCache},
  fetch::{get_ok, Fetch},
  provider::ProviderEndpoint,
  Result,
};

pub const PIPED_DIRECTORY_URL: &str =
  "https://raw.githubusercontent.com/wiki/TeamPiped/Piped-Frontend/Instances.md";

pub const CURATED_PIPED: &[&str] = &[
  "https://pipedapi.kavin.rocks",
  "https://pipedapi.syncpundit.io",
  "https://pipedapi.moomoo.me",
  "https://piped-api.lunar.icu",
  "https://pipedapi.adminforge.de",
];

pub const CURATED_INVIDIOUS: &[&str] = &[
  "https://invidious.snopyta.org",
  "https://vid.puffyan.us",
  "https://inv.nadeko.net",
  "https://invidious.projectsegfau.lt",
  "https://yewtu.be",
];

#[derive(Debug, Clone, Default)]
pub struct Candidates {
  pub piped: Vec<ProviderEndpoint>,
  pub invidious: Vec<ProviderEndpoint>,
}

pub struct ProviderDirectory {
  fetch: Arc<dyn Fetch>,
  remote_url: Option<String>,
  timeout: Duration,
  remote: TtlCache<(), Vec<String>>,
  rng: Mutex<Box<dyn RngCore + Send>>,
}

impl ProviderDirectory {
  pub fn new(
    fetch: Arc<dyn Fetch>,
    clock: Arc<dyn Clock>,
    rng: impl RngCore + Send + 'static,
  ) -> Self {
    Self {
      fetch,
      remote_url: Some(PIPED_DIRECTORY_URL.to_string()),
      timeout: Duration::from_secs(4),
      remote: TtlCache::new(Duration::from_secs(60 * 60), clock),
      rng: Mutex::new(Box::new(rng)),
    }
  }

  /// `None` disables the remote table and keeps to the curated lists.
  pub fn with_remote_url(self, remote_url: Option<String>) -> Self {
    Self { remote_url, ..self }
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    Self { timeout, ..self }
  }

  pub fn with_remote_ttl(self, ttl: Duration) -> Self {
    let remote = TtlCache::new(ttl, self.remote.clock());
    Self { remote, ..self }
  }

  /// Both families' candidates, deduplicated and shuffled.
  pub async fn candidates(&self) -> Candidates {
    let mut piped = self
      .remote_instances()
      .await
      .into_iter()
      .chain(CURATED_PIPED.iter().map(|s| s.to_string()))
      .map(ProviderEndpoint::piped)
      .unique()
      .collect_vec();

    let mut invidious = CURATED_INVIDIOUS
      .iter()
      .copied()
      .map(ProviderEndpoint::invidious)
      .collect_vec();

    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
    piped.shuffle(&mut *rng);
    invidious.shuffle(&mut *rng);

    Candidates { piped, invidious }
  }

  // never fails: an unreachable table just means no extra instances
  async fn remote_instances(&self) -> Vec<String> {
    let Some(remote_url) = &self.remote_url else {
      return vec![];
    };

    if let Some(instances) = self.remote.get(&()) {
      return instances;
    }

    match self.fetch_remote(remote_url).await {
      Ok(instances) => {
        debug!("fetched {} instances from {}", instances.len(), remote_url);
        self.remote.put((), instances.clone());
        instances
      }
      Err(e) => {
        warn!(
          "could not fetch instance list from {}, using curated list: {}",
          remote_url, e
        );
        vec![]
      }
    }
  }

  async fn fetch_remote(&self, remote_url: &str) -> Result<Vec<String>> {
    let body = get_ok(&*self.fetch, remote_url, self.timeout).await?;
    Ok(parse_instance_table(&String::from_utf8_lossy(&body)))
  }
}

/// Pulls API URLs out of a markdown table. The URL column is the header
/// cell mentioning `API`; rows that do not fit are skipped.
pub fn parse_instance_table(body: &str) -> Vec<String> {
  // cell index after splitting on `|`, so the leading empty cell counts
  const DEFAULT_COLUMN: usize = 2;

  let mut column = None;
  let mut instances = Vec::new();

  for line in body.lines().map(str::trim) {
    let cells = line.split('|').map(str::trim).collect_vec();

    if line.contains("API") {
      column = Some(
        cells
          .iter()
          .position(|c| c.contains("API"))
          .filter(|_| line.starts_with('|'))
          .unwrap_or(DEFAULT_COLUMN),
      );
      continue;
    }

    let Some(column) = column else {
      continue;
    };

    if !line.starts_with('|') || line.contains("---") {
      continue;
    }

    if let Some(url) = cells.get(column).filter(|c| c.starts_with("http")) {
      instances.push(url.trim_end_matches('/').to_string());
    }
  }

  instances
}

#[cfg(test)]
mod test {
  use std::collections::HashSet;

  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::{
    cache::test_clock::ManualClock, fetch::fake::FakeFetch, provider::Family,
  };

  const TABLE: &str = "\
# Instances

Some prose mentioning nothing in particular.

| Instance Frontend | Instance API | Locations | CDN |
| --- | --- | --- | --- |
| piped.video | https://pipedapi.kavin.rocks | Netherlands | Yes |
| piped.example | https://pipedapi.example.org/ | Germany | No |
| broken row without pipes
| piped.bad | not-a-url | Nowhere | No |
| short |
| piped.other | https://api.piped.other.net | Finland | No |
";

  fn directory(
    fetch: Arc<FakeFetch>,
    clock: Arc<ManualClock>,
    seed: u64,
  ) -> ProviderDirectory {
    ProviderDirectory::new(fetch, clock, StdRng::seed_from_u64(seed))
      .with_remote_url(Some("https://wiki.example/Instances.md".into()))
  }

  fn urls(endpoints: &[ProviderEndpoint]) -> HashSet<&str> {
    endpoints.iter().map(|e| e.base_url.as_str()).collect()
  }

  #[test]
  fn test_parse_instance_table() {
    assert_eq!(
      parse_instance_table(TABLE),
      [
        "https://pipedapi.kavin.rocks",
        "https://pipedapi.example.org",
        "https://api.piped.other.net",
      ]
    );
  }

  #[test]
  fn test_parse_malformed_table() {
    assert!(parse_instance_table("").is_empty());
    assert!(parse_instance_table("| a | https://x.example |").is_empty());
    assert!(parse_instance_table("<html>404</html>").is_empty());
  }

  #[tokio::test]
  async fn test_merges_and_dedups() {
    let fetch = Arc::new(
      FakeFetch::new().json("https://wiki.example/Instances.md", TABLE),
    );
    let dir = directory(fetch, ManualClock::new(), 7);

    let candidates = dir.candidates().await;
    let mut expected: HashSet<&str> = CURATED_PIPED.iter().copied().collect();
    expected.insert("https://pipedapi.example.org");
    expected.insert("https://api.piped.other.net");

    assert_eq!(candidates.piped.len(), expected.len());
    assert_eq!(urls(&candidates.piped), expected);
    assert!(candidates.piped.iter().all(|e| e.family == Family::Piped));

    let invidious: HashSet<&str> = CURATED_INVIDIOUS.iter().copied().collect();
    assert_eq!(urls(&candidates.invidious), invidious);
  }

  #[tokio::test]
  async fn test_remote_failure_falls_back_to_curated() {
    let fetch = Arc::new(
      FakeFetch::new().status("https://wiki.example/Instances.md", 500),
    );
    let dir = directory(fetch.clone(), ManualClock::new(), 1);

    let candidates = dir.candidates().await;
    let curated: HashSet<&str> = CURATED_PIPED.iter().copied().collect();
    assert_eq!(urls(&candidates.piped), curated);

    // failures are not memoized
    dir.candidates().await;
    assert_eq!(fetch.calls().len(), 2);
  }

  #[tokio::test]
  async fn test_remote_list_is_memoized() {
    let fetch = Arc::new(
      FakeFetch::new().json("https://wiki.example/Instances.md", TABLE),
    );
    let clock = ManualClock::new();
    let dir = directory(fetch.clone(), clock.clone(), 3);

    dir.candidates().await;
    clock.advance(Duration::from_secs(59 * 60));
    dir.candidates().await;
    assert_eq!(fetch.calls().len(), 1);

    clock.advance(Duration::from_secs(60));
    dir.candidates().await;
    assert_eq!(fetch.calls().len(), 2);
  }

  #[tokio::test]
  async fn test_remote_disabled() {
    let fetch = Arc::new(FakeFetch::new());
    let dir = directory(fetch.clone(), ManualClock::new(), 3)
      .with_remote_url(None);

    let candidates = dir.candidates().await;
    assert_eq!(candidates.piped.len(), CURATED_PIPED.len());
    assert!(fetch.calls().is_empty());
  }

  #[tokio::test]
  async fn test_shuffle_spreads_positions() {
    const RUNS: usize = 200;
    let n = CURATED_PIPED.len();
    let fetch = Arc::new(FakeFetch::new());
    // counts[position][curated index]
    let mut counts = vec![vec![0usize; n]; n];

    for seed in 0..RUNS as u64 {
      let dir = directory(fetch.clone(), ManualClock::new(), seed)
        .with_remote_url(None);
      let candidates = dir.candidates().await;
      assert_eq!(candidates.piped.len(), n);
      for (pos, endpoint) in candidates.piped.iter().enumerate() {
        let idx = CURATED_PIPED
          .iter()
          .position(|&u| u == endpoint.base_url)
          .unwrap();
        counts[pos][idx] += 1;
      }
    }

    // each instance lands in each slot about RUNS / n = 40 times
    let expected = RUNS / n;
    for (pos, row) in counts.iter().enumerate() {
      for (idx, &count) in row.iter().enumerate() {
        assert!(
          count > expected / 3 && count < expected * 2,
          "{} at position {} seen {} times",
          CURATED_PIPED[idx],
          pos,
          count
        );
      }
    }
  }
}
