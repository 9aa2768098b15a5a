//! Bounded retry with linear backoff.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;

/// Retry budget for one unit of work (one page, one course fetch).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Retries after the initial attempt.
  pub max_retries: u32,
  /// Linear backoff: the n-th retry sleeps `backoff_base * n`.
  pub backoff_base: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 2,
      backoff_base: Duration::from_millis(1000),
    }
  }
}

impl RetryPolicy {
  pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
    Self {
      max_retries,
      backoff_base,
    }
  }

  /// No retries at all.
  pub fn none() -> Self {
    Self {
      max_retries: 0,
      backoff_base: Duration::ZERO,
    }
  }
}

/// Run `op` until it succeeds or the retry budget is spent.
///
/// Non-transient failures (revoked token, explicit job failure) are returned
/// immediately; retrying them cannot succeed.
pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut attempt: u32 = 0;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(e) if attempt < policy.max_retries && e.is_transient() => {
        attempt += 1;
        let delay = policy.backoff_base * attempt;
        warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying after failure");
        tokio::time::sleep(delay).await;
      }
      Err(e) => return Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::SyncError;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn transient() -> SyncError {
    SyncError::UnexpectedStatus {
      endpoint: "/courses".into(),
      status: 503,
    }
  }

  fn fast(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1))
  }

  #[tokio::test]
  async fn succeeds_after_transient_failures() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result = with_backoff(fast(2), || async move {
      if calls.fetch_add(1, Ordering::SeqCst) < 2 {
        Err(transient())
      } else {
        Ok(42)
      }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_after_budget_is_spent() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result: Result<u32> = with_backoff(fast(2), || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Err(transient())
    })
    .await;

    assert!(result.is_err());
    // 1 initial attempt + 2 retries
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn auth_failure_is_not_retried() {
    let calls = AtomicU32::new(0);
    let calls = &calls;

    let result: Result<u32> = with_backoff(fast(5), || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Err(SyncError::Unauthorized)
    })
    .await;

    assert!(matches!(result, Err(SyncError::Unauthorized)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
