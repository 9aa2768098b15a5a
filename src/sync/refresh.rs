//! Timer-driven background revalidation.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::Result;

/// Owner handle for a background refresh task.
///
/// The timer lives exactly as long as the handle: dropping it (or calling
/// [`stop`](RefreshHandle::stop)) cancels the interval, which is the moral
/// equivalent of clearing the timer when the owning view unmounts. A pass
/// already in flight runs to completion; only the schedule is cancelled.
pub struct RefreshHandle {
  shutdown: watch::Sender<bool>,
}

impl RefreshHandle {
  /// Spawn a refresh pass every `period`.
  ///
  /// The refresh closure returns a `Result` so the policy stays visible at
  /// the call site: this background driver logs failures and moves on,
  /// leaving whatever was cached before untouched. The foreground is never
  /// told about a failed background pass.
  pub fn spawn<F, Fut>(period: Duration, refresh: F) -> Self
  where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
  {
    let (shutdown, mut stopped) = watch::channel(false);

    tokio::spawn(async move {
      let mut interval = tokio::time::interval(period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first tick completes immediately; the foreground has already
      // loaded at this point, so skip straight to the periodic schedule.
      interval.tick().await;

      loop {
        tokio::select! {
          _ = interval.tick() => {
            match refresh().await {
              Ok(()) => debug!("background refresh completed"),
              Err(e) => warn!(error = %e, "background refresh failed, keeping cached data"),
            }
          }
          _ = stopped.changed() => break,
        }
      }
    });

    Self { shutdown }
  }

  /// Cancel the timer. The refresh task exits after any pass currently in
  /// flight finishes.
  pub fn stop(&self) {
    let _ = self.shutdown.send(true);
  }
}

impl Drop for RefreshHandle {
  fn drop(&mut self) {
    let _ = self.shutdown.send(true);
  }
}

/// Fire-and-forget single revalidation pass, used right after serving a
/// cache hit so displayed data catches up with the remote without blocking
/// or surfacing errors.
pub fn revalidate<F, Fut>(refresh: F)
where
  F: FnOnce() -> Fut + Send + 'static,
  Fut: Future<Output = Result<()>> + Send + 'static,
{
  tokio::spawn(async move {
    if let Err(e) = refresh().await {
      warn!(error = %e, "revalidation failed, keeping cached data");
    }
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::SyncError;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  #[tokio::test]
  async fn refreshes_on_every_tick() {
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();

    let handle = RefreshHandle::spawn(Duration::from_millis(20), move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
      }
    });

    tokio::time::sleep(Duration::from_millis(110)).await;
    handle.stop();

    let count = runs.load(Ordering::SeqCst);
    assert!(count >= 3, "expected several refresh passes, got {}", count);
  }

  #[tokio::test]
  async fn stop_cancels_the_timer() {
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();

    let handle = RefreshHandle::spawn(Duration::from_millis(10), move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
      }
    });

    tokio::time::sleep(Duration::from_millis(35)).await;
    handle.stop();
    // Let any pass racing the stop signal finish before sampling.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let at_stop = runs.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(runs.load(Ordering::SeqCst), at_stop);
  }

  #[tokio::test]
  async fn failures_do_not_kill_the_loop() {
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();

    let _handle = RefreshHandle::spawn(Duration::from_millis(10), move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(SyncError::Config("remote unreachable".into()))
      }
    });

    tokio::time::sleep(Duration::from_millis(55)).await;
    assert!(runs.load(Ordering::SeqCst) >= 3);
  }

  #[tokio::test]
  async fn revalidate_runs_exactly_once() {
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();

    revalidate(move || async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }
}
