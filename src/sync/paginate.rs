//! Parallel paginated fetching with round-based end-of-data detection.

use futures::future::join_all;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Tuning for one paginated fetch.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
  /// Records requested per page. 100 is the most the Canvas API will return.
  pub page_size: usize,
  /// Concurrent page requests per round.
  pub parallel_pages: usize,
}

impl Default for PageOptions {
  fn default() -> Self {
    Self {
      page_size: 100,
      parallel_pages: 2,
    }
  }
}

/// Fetch an unbounded remote collection by repeated page requests.
///
/// Pages are requested in rounds of `parallel_pages` concurrent requests,
/// starting at page 1. All pages of a round are issued together and the stop
/// conditions are evaluated only once the whole round has settled, so a round
/// may request pages past the end of the data. Items are concatenated in
/// page-number order, never completion order.
///
/// The end of the collection is inferred, not server-declared: any
/// *successful* page with fewer than `page_size` items ends the fetch after
/// its round. A failed page is not a short page — it is logged, contributes
/// nothing, and never terminates the fetch by itself. A round in which every
/// page fails aborts the whole fetch: that is an outage, not end-of-data.
pub async fn fetch_all_pages<T, F, Fut>(options: PageOptions, fetch_page: F) -> Result<Vec<T>>
where
  F: Fn(u32) -> Fut,
  Fut: Future<Output = Result<Vec<T>>>,
{
  let round_size = options.parallel_pages.max(1);
  let mut all = Vec::new();
  let mut page: u32 = 1;

  loop {
    let pages: Vec<u32> = (0..round_size as u32).map(|i| page + i).collect();
    let outcomes = join_all(pages.iter().map(|p| fetch_page(*p))).await;

    let mut end_of_data = false;
    let mut errors: Vec<SyncError> = Vec::new();

    for (p, outcome) in pages.iter().zip(outcomes) {
      match outcome {
        Ok(items) => {
          debug!(page = p, count = items.len(), "page fetched");
          if items.len() < options.page_size {
            end_of_data = true;
          }
          all.extend(items);
        }
        Err(e) => {
          warn!(page = p, error = %e, "page request failed, dropping page");
          errors.push(e);
        }
      }
    }

    // A revoked token fails every page the same way; surface it as itself
    // rather than as a generic round failure.
    if let Some(fatal) = errors.iter().position(|e| !e.is_transient()) {
      return Err(errors.swap_remove(fatal));
    }
    if errors.len() == round_size {
      return Err(SyncError::PageRoundFailed {
        pages: round_size,
        first_error: errors[0].to_string(),
      });
    }

    if end_of_data {
      return Ok(all);
    }
    page += round_size as u32;
  }
}
