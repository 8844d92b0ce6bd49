use std::{
  borrow::Borrow,
  collections::HashMap,
  hash::Hash,
  sync::{Arc, Mutex, PoisonError},
  time::{Duration, Instant},
};

pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// Process-wide memo with a fixed time-to-live. Expired entries are
/// dropped when read; there is no background sweep. Concurrent writers
/// for the same key simply overwrite each other.
pub struct TtlCache<K, V> {
  ttl: Duration,
  clock: Arc<dyn Clock>,
  // `None` expiry: the TTL runs past what `Instant` can represent
  entries: Mutex<HashMap<K, (V, Option<Instant>)>>,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash,
  V: Clone,
{
  pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      ttl,
      clock,
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn clock(&self) -> Arc<dyn Clock> {
    self.clock.clone()
  }

  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Eq + Hash + ?Sized,
  {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    let (value, expires_at) = entries.get(key)?;
    if expires_at.map_or(false, |at| self.clock.now() >= at) {
      entries.remove(key);
      return None;
    }
    Some(value.clone())
  }

  pub fn put(&self, key: K, value: V) {
    let expires_at = self.clock.now().checked_add(self.ttl);
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, (value, expires_at));
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}
