//! Fan-out of per-entity fetches with bounded concurrency.

use futures::future::join_all;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use tracing::warn;

use crate::error::Result;

/// Fetch a collection for each id, at most `max_concurrent` in flight.
///
/// Ids are processed in chunks of `max_concurrent`; a chunk is awaited in
/// full (failures included) before the next one starts. The result map has an
/// entry for every input id — an entity whose fetch fails (after whatever
/// retries the fetch closure does internally) maps to an empty collection,
/// so one bad course never aborts the batch.
pub async fn fetch_for_each<K, T, F, Fut>(
  ids: &[K],
  max_concurrent: usize,
  fetch: F,
) -> HashMap<K, Vec<T>>
where
  K: Eq + Hash + Clone + Display,
  F: Fn(K) -> Fut,
  Fut: Future<Output = Result<Vec<T>>>,
{
  let mut out = HashMap::with_capacity(ids.len());

  for chunk in ids.chunks(max_concurrent.max(1)) {
    let results = join_all(chunk.iter().map(|id| fetch(id.clone()))).await;

    for (id, result) in chunk.iter().zip(results) {
      match result {
        Ok(items) => {
          out.insert(id.clone(), items);
        }
        Err(e) => {
          warn!(entity = %id, error = %e, "batch fetch failed for entity, yielding empty collection");
          out.insert(id.clone(), Vec::new());
        }
      }
    }
  }

  out
}
