//! Cache layer that orchestrates the memory and persisted tiers around a
//! network fetch.

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::SharedClock;
use crate::error::Result;

use super::memory::{CachedCollection, TtlCache};
use super::storage::CacheStorage;
use super::traits::CacheResult;

/// Read-through cache for one collection type.
///
/// Lookup order: unexpired memory entry, unexpired persisted entry (promoted
/// into memory on hit), then the network. Successful fetches replace both
/// tiers; a failed fetch falls back to whatever stale copy exists rather than
/// erroring, since a stale list is more useful to the caller than no list.
pub struct CacheLayer<T, S: CacheStorage> {
  memory: Arc<TtlCache<T>>,
  storage: Arc<S>,
  clock: SharedClock,
  ttl: Duration,
}

impl<T, S> CacheLayer<T, S>
where
  T: Clone + Serialize + DeserializeOwned,
  S: CacheStorage,
{
  pub fn new(storage: Arc<S>, clock: SharedClock) -> Self {
    Self {
      memory: Arc::new(TtlCache::new(clock.clone())),
      storage,
      clock,
      ttl: Duration::minutes(5),
    }
  }

  /// Set how long cached entries stay valid.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Look up `key` in the cache tiers without ever touching the network.
  /// Returns `None` when both tiers miss or are expired.
  pub fn peek(&self, key: &str) -> Option<CacheResult<Vec<T>>> {
    if let Some(entry) = self.memory.get_valid(key) {
      return Some(CacheResult::from_memory(entry.data, entry.fetched_at));
    }

    let entry = self.load_persisted(key)?;
    if entry.is_valid(self.clock.now()) {
      // Promote into memory with its original timestamp so the TTL window
      // is not silently extended.
      self.memory.restore(key, entry.clone());
      return Some(CacheResult::from_persisted(entry.data, entry.fetched_at));
    }
    None
  }

  /// Fetch a collection with cache-first strategy.
  pub async fn fetch<F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<Vec<T>>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    if let Some(hit) = self.peek(key) {
      return Ok(hit);
    }

    match fetcher().await {
      Ok(data) => {
        self.store(key, &data)?;
        Ok(CacheResult::from_network(data))
      }
      Err(e) => {
        // Serve whatever stale copy we still have; the remote state will be
        // picked up by the next refresh.
        if let Some(stale) = self.memory.get(key).or_else(|| self.load_persisted(key)) {
          warn!(key, error = %e, "fetch failed, serving stale cache entry");
          return Ok(CacheResult::stale(stale.data, stale.fetched_at));
        }
        Err(e)
      }
    }
  }

  /// Unconditionally refetch `key` and replace both cache tiers.
  ///
  /// Background refresh paths call this and log the error themselves;
  /// foreground "force refresh" actions call it and surface the error.
  pub async fn refresh<F, Fut>(&self, key: &str, fetcher: F) -> Result<Vec<T>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let data = fetcher().await?;
    self.store(key, &data)?;
    Ok(data)
  }

  /// Drop `key` from both tiers.
  pub fn invalidate(&self, key: &str) -> Result<()> {
    self.memory.clear(key);
    self.storage.remove(key)
  }

  fn store(&self, key: &str, data: &[T]) -> Result<()> {
    self.memory.set(key, data.to_vec(), self.ttl);
    let payload = serde_json::to_string(data)?;
    self.storage.store(key, &payload, self.clock.now())
  }

  /// Read and decode a persisted entry. Malformed payloads are a cache miss.
  fn load_persisted(&self, key: &str) -> Option<CachedCollection<T>> {
    let entry = match self.storage.load(key) {
      Ok(Some(entry)) => entry,
      Ok(None) => return None,
      Err(e) => {
        warn!(key, error = %e, "persisted cache read failed");
        return None;
      }
    };

    match serde_json::from_str::<Vec<T>>(&entry.payload) {
      Ok(data) => Some(CachedCollection {
        data,
        fetched_at: entry.fetched_at,
        ttl: self.ttl,
      }),
      Err(e) => {
        debug!(key, error = %e, "discarding undecodable cache payload");
        None
      }
    }
  }
}

impl<T, S: CacheStorage> Clone for CacheLayer<T, S> {
  fn clone(&self) -> Self {
    Self {
      memory: Arc::clone(&self.memory),
      storage: Arc::clone(&self.storage),
      clock: self.clock.clone(),
      ttl: self.ttl,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::{NoopStorage, SqliteStorage};
  use crate::cache::traits::CacheSource;
  use crate::clock::test_support::ManualClock;
  use crate::error::SyncError;
  use chrono::Utc;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn layer_with_clock() -> (CacheLayer<u32, NoopStorage>, Arc<ManualClock>) {
    let clock = ManualClock::starting_at(Utc::now());
    let layer = CacheLayer::new(Arc::new(NoopStorage), clock.clone());
    (layer, clock)
  }

  #[tokio::test]
  async fn second_fetch_within_ttl_hits_cache_without_network() {
    let (layer, _clock) = layer_with_clock();
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let first = layer
      .fetch("courses", || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1, 2, 3])
      })
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = layer
      .fetch("courses", || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![9])
      })
      .await
      .unwrap();
    assert_eq!(second.source, CacheSource::MemoryFresh);
    assert_eq!(second.data, vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "no network call on cache hit");
  }

  #[tokio::test]
  async fn fetch_after_expiry_makes_one_network_call_and_overwrites() {
    let (layer, clock) = layer_with_clock();
    let calls = AtomicU32::new(0);
    let calls = &calls;

    layer
      .fetch("courses", || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1])
      })
      .await
      .unwrap();

    clock.advance(Duration::minutes(6));

    let result = layer
      .fetch("courses", || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![2])
      })
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data, vec![2]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The new entry replaced the old one
    let cached = layer
      .fetch("courses", || async { Ok(vec![0]) })
      .await
      .unwrap();
    assert_eq!(cached.data, vec![2]);
  }

  #[tokio::test]
  async fn failed_fetch_serves_stale_entry() {
    let (layer, clock) = layer_with_clock();

    layer.fetch("courses", || async { Ok(vec![7]) }).await.unwrap();
    clock.advance(Duration::minutes(6));

    let result = layer
      .fetch("courses", || async {
        Err(SyncError::Config("network down".into()))
      })
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Stale);
    assert_eq!(result.data, vec![7]);
  }

  #[tokio::test]
  async fn failed_fetch_without_cache_propagates() {
    let (layer, _clock) = layer_with_clock();

    let result = layer
      .fetch("courses", || async {
        Err::<Vec<u32>, _>(SyncError::Unauthorized)
      })
      .await;
    assert!(matches!(result, Err(SyncError::Unauthorized)));
  }

  #[tokio::test]
  async fn persisted_entry_survives_restart() {
    let clock = ManualClock::starting_at(Utc::now());
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());

    let layer: CacheLayer<u32, _> = CacheLayer::new(storage.clone(), clock.clone());
    layer.fetch("courses", || async { Ok(vec![5]) }).await.unwrap();

    // New layer, empty memory tier, same storage: fresh persisted entry is
    // served without a network call.
    let restarted: CacheLayer<u32, _> = CacheLayer::new(storage, clock.clone());
    let result = restarted
      .fetch("courses", || async {
        Err(SyncError::Config("network should not be touched".into()))
      })
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Persisted);
    assert_eq!(result.data, vec![5]);
  }

  #[tokio::test]
  async fn refresh_replaces_entry_unconditionally() {
    let (layer, _clock) = layer_with_clock();

    layer.fetch("courses", || async { Ok(vec![1]) }).await.unwrap();
    layer.refresh("courses", || async { Ok(vec![2]) }).await.unwrap();

    let result = layer
      .fetch("courses", || async { Ok(vec![0]) })
      .await
      .unwrap();
    assert_eq!(result.data, vec![2]);
  }
}
