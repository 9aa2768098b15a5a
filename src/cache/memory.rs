//! In-memory TTL cache for named collections.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::clock::SharedClock;

/// A cached collection snapshot with its expiry window.
#[derive(Debug, Clone)]
pub struct CachedCollection<T> {
  pub data: Vec<T>,
  pub fetched_at: DateTime<Utc>,
  pub ttl: Duration,
}

impl<T> CachedCollection<T> {
  /// Valid exactly while `now < fetched_at + ttl`.
  pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
    now < self.fetched_at + self.ttl
  }
}

/// String-keyed collection cache with time-based invalidation.
///
/// Constructed explicitly with an injected clock so tests control expiry
/// without sleeping. Interior mutability via a mutex so the cache can be
/// shared (`Arc`) with background refresh tasks; a miss is never an error,
/// it just means the caller fetches.
pub struct TtlCache<T> {
  entries: Mutex<HashMap<String, CachedCollection<T>>>,
  clock: SharedClock,
}

impl<T: Clone> TtlCache<T> {
  pub fn new(clock: SharedClock) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      clock,
    }
  }

  /// Look up an entry regardless of freshness. No side effects.
  pub fn get(&self, key: &str) -> Option<CachedCollection<T>> {
    self.lock().get(key).cloned()
  }

  /// Look up an entry only if it is still within its TTL.
  pub fn get_valid(&self, key: &str) -> Option<CachedCollection<T>> {
    let now = self.clock.now();
    self.lock().get(key).filter(|e| e.is_valid(now)).cloned()
  }

  /// Store a collection, stamping it with the current time. Overwrites any
  /// prior entry for `key`.
  pub fn set(&self, key: &str, data: Vec<T>, ttl: Duration) {
    let entry = CachedCollection {
      data,
      fetched_at: self.clock.now(),
      ttl,
    };
    self.lock().insert(key.to_string(), entry);
  }

  /// Reinstate an entry with its original timestamp, e.g. when promoting a
  /// persisted entry into memory without extending its TTL window.
  pub fn restore(&self, key: &str, entry: CachedCollection<T>) {
    self.lock().insert(key.to_string(), entry);
  }

  /// Whether `key` holds an unexpired entry.
  pub fn is_valid(&self, key: &str) -> bool {
    let now = self.clock.now();
    self.lock().get(key).map(|e| e.is_valid(now)).unwrap_or(false)
  }

  /// Remove an entry. Used by explicit "force refresh" actions.
  pub fn clear(&self, key: &str) {
    self.lock().remove(key);
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedCollection<T>>> {
    // A poisoned lock only means another task panicked mid-insert; the map
    // itself is still usable.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::test_support::ManualClock;

  fn cache_with_clock() -> (TtlCache<u32>, std::sync::Arc<ManualClock>) {
    let clock = ManualClock::starting_at(Utc::now());
    (TtlCache::new(clock.clone()), clock)
  }

  #[test]
  fn valid_until_ttl_elapses() {
    let (cache, clock) = cache_with_clock();
    cache.set("courses", vec![1, 2, 3], Duration::minutes(5));

    assert!(cache.is_valid("courses"));

    clock.advance(Duration::minutes(4) + Duration::seconds(59));
    assert!(cache.is_valid("courses"));

    clock.advance(Duration::seconds(1));
    assert!(!cache.is_valid("courses"));
    // The entry is still present, just stale
    assert!(cache.get("courses").is_some());
    assert!(cache.get_valid("courses").is_none());
  }

  #[test]
  fn clear_makes_key_absent() {
    let (cache, _clock) = cache_with_clock();
    cache.set("courses", vec![1], Duration::minutes(5));

    cache.clear("courses");
    assert!(!cache.is_valid("courses"));
    assert!(cache.get("courses").is_none());
  }

  #[test]
  fn set_overwrites_existing_entry() {
    let (cache, clock) = cache_with_clock();
    cache.set("courses", vec![1], Duration::minutes(5));
    clock.advance(Duration::minutes(10));

    cache.set("courses", vec![2], Duration::minutes(5));
    let entry = cache.get_valid("courses").unwrap();
    assert_eq!(entry.data, vec![2]);
  }

  #[test]
  fn missing_key_is_invalid() {
    let (cache, _clock) = cache_with_clock();
    assert!(!cache.is_valid("nope"));
    assert!(cache.get("nope").is_none());
  }
}
