//! Result metadata shared by the cache layer.

use chrono::{DateTime, Utc};

/// Data returned by a cache-layer fetch, tagged with where it came from so
/// callers can decide whether to revalidate in the background.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// When the data was cached; `None` for fresh network data.
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_memory(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::MemoryFresh,
      cached_at: Some(cached_at),
    }
  }

  pub fn from_persisted(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Persisted,
      cached_at: Some(cached_at),
    }
  }

  pub fn stale(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Stale,
      cached_at: Some(cached_at),
    }
  }

  /// Whether this result was served from a cache tier (as opposed to a live
  /// fetch). Cache hits are candidates for opportunistic revalidation.
  pub fn from_cache(&self) -> bool {
    self.source != CacheSource::Network
  }
}

/// Where a fetch result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the network.
  Network,
  /// Unexpired entry from the in-memory cache.
  MemoryFresh,
  /// Unexpired entry promoted from the persisted store.
  Persisted,
  /// Expired entry served because the network fetch failed.
  Stale,
}
